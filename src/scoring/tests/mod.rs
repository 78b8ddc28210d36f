pub(crate) mod common;

mod service;
