pub mod catalog;
pub mod design;
pub mod selection;
