use chrono::{DateTime, NaiveDateTime, Utc};

use crate::coerce::{FloatWidth, IntWidth, Kind, Value};

/// A writable field inside a live record.
pub trait Slot {
    /// Write `value` into the field. Hands the value back if it is not of
    /// the field's kind.
    fn store(&mut self, value: Value) -> Result<(), Value>;
}

/// A Rust type that can sit behind a `#[csv("...")]` annotation.
pub trait FieldValue: Slot + Default + 'static {
    fn kind() -> Kind;
}

macro_rules! scalar_field {
    ($ty:ty, $variant:ident, $kind:expr) => {
        impl Slot for $ty {
            fn store(&mut self, value: Value) -> Result<(), Value> {
                match value {
                    Value::$variant(v) => {
                        *self = v;
                        Ok(())
                    }
                    other => Err(other),
                }
            }
        }

        impl FieldValue for $ty {
            fn kind() -> Kind {
                $kind
            }
        }
    };
}

scalar_field!(String, Str, Kind::String);
scalar_field!(i8, I8, Kind::Int(IntWidth::W8));
scalar_field!(i16, I16, Kind::Int(IntWidth::W16));
scalar_field!(i32, I32, Kind::Int(IntWidth::W32));
scalar_field!(i64, I64, Kind::Int(IntWidth::W64));
scalar_field!(u8, U8, Kind::Uint(IntWidth::W8));
scalar_field!(u16, U16, Kind::Uint(IntWidth::W16));
scalar_field!(u32, U32, Kind::Uint(IntWidth::W32));
scalar_field!(u64, U64, Kind::Uint(IntWidth::W64));
scalar_field!(f32, F32, Kind::Float(FloatWidth::W32));
scalar_field!(f64, F64, Kind::Float(FloatWidth::W64));
scalar_field!(bool, Bool, Kind::Bool);
scalar_field!(DateTime<Utc>, Time, Kind::Time);

impl Slot for NaiveDateTime {
    fn store(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Time(t) => {
                *self = t.naive_utc();
                Ok(())
            }
            other => Err(other),
        }
    }
}

impl FieldValue for NaiveDateTime {
    fn kind() -> Kind {
        Kind::Time
    }
}

// An already-present payload is overwritten in place; otherwise a fresh one
// is filled and installed.
impl<T: FieldValue> Slot for Option<T> {
    fn store(&mut self, value: Value) -> Result<(), Value> {
        if value == Value::Null {
            *self = None;
            return Ok(());
        }
        match self {
            Some(existing) => existing.store(value),
            None => {
                let mut fresh = T::default();
                fresh.store(value)?;
                *self = Some(fresh);
                Ok(())
            }
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> Kind {
        Kind::optional(T::kind())
    }
}

/// Dynamic records hold their cells as plain [`Value`]s.
impl Slot for Value {
    fn store(&mut self, value: Value) -> Result<(), Value> {
        *self = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scalar_store_rejects_other_kinds() {
        let mut n = 0u16;
        assert!(n.store(Value::U16(9)).is_ok());
        assert_eq!(n, 9);
        assert_eq!(n.store(Value::U8(1)), Err(Value::U8(1)));
        assert_eq!(n, 9);
    }

    #[test]
    fn test_option_installs_then_overwrites() {
        let mut opt: Option<i32> = None;
        opt.store(Value::I32(4)).unwrap();
        assert_eq!(opt, Some(4));
        opt.store(Value::I32(5)).unwrap();
        assert_eq!(opt, Some(5));
        assert!(opt.store(Value::Bool(true)).is_err());
        assert_eq!(opt, Some(5));
    }

    #[test]
    fn test_option_rejected_value_stays_unset() {
        let mut opt: Option<String> = None;
        assert!(opt.store(Value::U8(1)).is_err());
        assert_eq!(opt, None);
    }

    #[test]
    fn test_naive_time_takes_utc_wall_clock() {
        let t = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        let mut naive = NaiveDateTime::default();
        naive.store(Value::Time(t)).unwrap();
        assert_eq!(naive, t.naive_utc());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(<Option<Option<u8>>>::kind().to_string(), "option<option<u8>>");
        assert_eq!(<DateTime<Utc>>::kind(), Kind::Time);
    }
}
