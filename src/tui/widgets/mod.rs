pub mod help;
pub mod result_list;
pub mod root;
