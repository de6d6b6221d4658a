mod common;
mod ownership;
