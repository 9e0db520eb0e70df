//! Raw kernel ABI definitions.

#![allow(non_camel_case_types, non_snake_case, dead_code)]

pub mod input;
