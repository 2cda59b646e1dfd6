mod common;
mod pagination;
mod service;
