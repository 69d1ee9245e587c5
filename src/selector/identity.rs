use serde_json::Value;
use std::sync::Arc;

/// The "is this the same value" check used to suppress selector notifications.
///
/// Shared pointers compare by address and scalars by value. Freshly built
/// composite values are never identical to anything: a selector that returns
/// a new array or object on every call notifies on every store write, even
/// when the contents did not change. Select the shared `Arc<Value>` of a slice,
/// or a scalar inside it, to avoid that.
pub trait Identity {
    fn identical(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
    fn identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: Identity> Identity for Option<T> {
    fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.identical(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<A: Identity, B: Identity> Identity for (A, B) {
    fn identical(&self, other: &Self) -> bool {
        self.0.identical(&other.0) && self.1.identical(&other.1)
    }
}

impl Identity for Value {
    fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(_), _) | (Value::Object(_), _) => false,
            (a, b) => a == b,
        }
    }
}

macro_rules! identity_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identity for $ty {
                fn identical(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

identity_by_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arcs_compare_by_address() {
        let a = Arc::new(json!({ "x": 1 }));
        let b = Arc::new(json!({ "x": 1 }));
        assert!(a.identical(&a.clone()));
        assert!(!a.identical(&b));
    }

    #[test]
    fn json_scalars_compare_by_value() {
        assert!(json!(1).identical(&json!(1)));
        assert!(json!("a").identical(&json!("a")));
        assert!(Value::Null.identical(&Value::Null));
        assert!(!json!(1).identical(&json!(2)));
    }

    #[test]
    fn json_composites_are_never_identical() {
        let value = json!({ "x": 1 });
        assert!(!value.identical(&value));
        assert!(!json!([]).identical(&json!([])));
    }

    #[test]
    fn nan_is_not_identical_to_itself() {
        assert!(!f64::NAN.identical(&f64::NAN));
    }
}
