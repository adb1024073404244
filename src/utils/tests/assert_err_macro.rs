use crate::assert_err;
use crate::errors::{NestedError, TreeError};
use crate::nested::KeyPath;

fn depth_exceeded() -> Result<(), TreeError> {
    Err(NestedError::DepthExceeded {
        configured: 2,
        reached: 3,
    })
}

fn shape_mismatch() -> Result<(), TreeError> {
    Err(NestedError::ShapeMismatch {
        path_hint: KeyPath::from_iter(["a"]).child(0usize),
        message: "键`0`只存在于第一棵树".to_string(),
    })
}

#[test]
fn test_assert_err_macro_short_forms() {
    assert_err!(depth_exceeded());
    assert_err!(depth_exceeded(), NestedError::DepthExceeded(2, 3));
    assert_err!(shape_mismatch(), NestedError::ShapeMismatch("a.0"));
}

#[test]
fn test_assert_err_macro_patterns() {
    assert_err!(depth_exceeded(), NestedError::DepthExceeded { .. });
    assert_err!(
        shape_mismatch(),
        NestedError::ShapeMismatch { message, .. } if message.contains("第一棵树")
    );
}

#[test]
#[should_panic(expected = "预期 Err")]
fn test_assert_err_macro_on_ok() {
    let ok: Result<u8, TreeError> = Ok(1);
    assert_err!(ok);
}
