pub mod actuator;
pub mod servo;
