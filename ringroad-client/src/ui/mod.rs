pub mod layout;
pub mod markup;
