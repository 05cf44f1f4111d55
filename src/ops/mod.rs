pub mod grouping;
pub mod search;
pub mod url_edit;
