//! Permission resolution and access-grant propagation.

mod controller;

pub use controller::AccessController;
