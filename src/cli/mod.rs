pub mod menu;
pub mod run;
