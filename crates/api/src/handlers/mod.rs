pub mod admin;
pub mod pages;
pub mod revisions;
pub mod search;
pub mod shared;
pub mod shares;
