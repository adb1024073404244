mod nested;
pub use self::nested::*;
