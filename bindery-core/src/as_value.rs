use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
#[cfg(feature = "chrono")]
use chrono::{Datelike, Timelike};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion of Rust values into a bindable `Value`.
pub trait AsValue {
    /// Typed NULL for this type.
    fn as_empty_value() -> Value
    where
        Self: Sized;
    /// Convert into owned `Value`.
    fn as_value(self) -> Value;
}

/// Extraction of Rust values out of a `Value` read from a result row.
pub trait FromValue: Sized {
    /// Try to convert a dynamic `Value` into `Self`.
    fn try_from_value(value: Value) -> Result<Self>;
}

fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} to {}",
        truncate_long!(format!("{value:?}"), true),
        any::type_name::<T>(),
    ))
}

impl AsValue for Value {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
        }
    };
}

macro_rules! impl_integer {
    ($source:ty, $destination:path) => {
        impl_as_value!($source, $destination);
        impl FromValue for $source {
            fn try_from_value(value: Value) -> Result<Self> {
                let wide: i128 = match value {
                    Value::Int8(Some(v)) => v as _,
                    Value::Int16(Some(v)) => v as _,
                    Value::Int32(Some(v)) => v as _,
                    Value::Int64(Some(v)) => v as _,
                    Value::UInt8(Some(v)) => v as _,
                    Value::UInt16(Some(v)) => v as _,
                    Value::UInt32(Some(v)) => v as _,
                    Value::UInt64(Some(v)) => v as _,
                    Value::Decimal(Some(v)) if v.is_integer() => v.to_i128().ok_or_else(|| {
                        Error::msg(format!("Value {v}: Decimal does not fit into i128"))
                    })?,
                    Value::Float64(Some(v)) if v.is_finite() && v.fract() == 0.0 => v as _,
                    Value::Unknown(Some(ref v)) | Value::Varchar(Some(ref v)) => {
                        return v.trim().parse::<Self>().with_context(|| {
                            format!(
                                "While parsing `{}` as {}",
                                truncate_long!(v),
                                any::type_name::<Self>()
                            )
                        });
                    }
                    _ => return Err(cannot_convert::<Self>(&value)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}
impl_integer!(i8, Value::Int8);
impl_integer!(i16, Value::Int16);
impl_integer!(i32, Value::Int32);
impl_integer!(i64, Value::Int64);
impl_integer!(u8, Value::UInt8);
impl_integer!(u16, Value::UInt16);
impl_integer!(u32, Value::UInt32);
impl_integer!(u64, Value::UInt64);

impl_as_value!(bool, Value::Boolean);
impl FromValue for bool {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            // Backends without a boolean type store 0 and 1
            Value::Int8(Some(v @ (0 | 1))) => Ok(v == 1),
            Value::Int16(Some(v @ (0 | 1))) => Ok(v == 1),
            Value::Int32(Some(v @ (0 | 1))) => Ok(v == 1),
            Value::Int64(Some(v @ (0 | 1))) => Ok(v == 1),
            Value::UInt8(Some(v @ (0 | 1))) => Ok(v == 1),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(f32, Value::Float32);
impl FromValue for f32 {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(Some(v)) => Ok(v),
            Value::Float64(Some(v)) if v.is_finite() && (v as f32) as f64 == v => Ok(v as _),
            Value::Float64(Some(v)) if !v.is_finite() => Ok(v as _),
            _ => f64::try_from_value(value)
                .ok()
                .filter(|v| (*v as f32) as f64 == *v)
                .map(|v| v as f32)
                .ok_or_else(|| Error::msg("The value does not fit into f32")),
        }
    }
}

impl_as_value!(f64, Value::Float64);
impl FromValue for f64 {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Ok(v as _),
            Value::Int8(Some(v)) => Ok(v as _),
            Value::Int16(Some(v)) => Ok(v as _),
            Value::Int32(Some(v)) => Ok(v as _),
            Value::UInt8(Some(v)) => Ok(v as _),
            Value::UInt16(Some(v)) => Ok(v as _),
            Value::UInt32(Some(v)) => Ok(v as _),
            Value::Decimal(Some(v)) => v
                .to_f64()
                .ok_or_else(|| Error::msg(format!("Value {v}: Decimal does not fit into f64"))),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(Decimal, Value::Decimal);
impl FromValue for Decimal {
    fn try_from_value(value: Value) -> Result<Self> {
        let error = || cannot_convert::<Self>(&value);
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v.into()),
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::UInt8(Some(v)) => Ok(v.into()),
            Value::UInt16(Some(v)) => Ok(v.into()),
            Value::UInt32(Some(v)) => Ok(v.into()),
            Value::UInt64(Some(v)) => Ok(v.into()),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or_else(error),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(error),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => v
                .trim()
                .parse()
                .with_context(|| format!("While parsing `{}` as Decimal", truncate_long!(v))),
            _ => Err(error()),
        }
    }
}

impl_as_value!(char, Value::Char);
impl FromValue for char {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(Error::msg(format!(
                        "Cannot convert `{}` to char, it must be exactly one character long",
                        truncate_long!(v)
                    ))),
                }
            }
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(String, Value::Varchar);
impl_as_value!(&str, Value::Varchar);
impl_as_value!(Cow<'_, str>, Value::Varchar);
impl FromValue for String {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => Ok(v),
            Value::Char(Some(v)) => Ok(v.into()),
            Value::Json(Some(serde_json::Value::String(v))) => Ok(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(Vec<u8>, Value::Blob);
impl_as_value!(&[u8], Value::Blob);
impl_as_value!(Box<[u8]>, Value::Blob);
impl FromValue for Vec<u8> {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(Date, Value::Date);
impl FromValue for Date {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(Time, Value::Time);
impl FromValue for Time {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl FromValue for PrimitiveDateTime {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Date(Some(v)) => Ok(v.midnight()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(OffsetDateTime, Value::TimestampWithTimezone);
impl FromValue for OffsetDateTime {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(Uuid, Value::Uuid);
impl FromValue for Uuid {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => Uuid::parse_str(v)
                .with_context(|| format!("While parsing `{}` as Uuid", truncate_long!(v))),
            Value::Blob(Some(ref v)) => Uuid::from_slice(v).map_err(Into::into),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(serde_json::Value, Value::Json);
impl FromValue for serde_json::Value {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => serde_json::from_str(v)
                .with_context(|| format!("While parsing `{}` as json", truncate_long!(v))),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

#[cfg(feature = "chrono")]
fn chrono_date(v: &chrono::NaiveDate) -> Option<Date> {
    let month = time::Month::try_from(v.month() as u8).ok()?;
    Date::from_calendar_date(v.year(), month, v.day() as _).ok()
}

#[cfg(feature = "chrono")]
fn chrono_time(v: &chrono::NaiveTime) -> Option<Time> {
    Time::from_hms_nano(v.hour() as _, v.minute() as _, v.second() as _, v.nanosecond()).ok()
}

// Dates outside of the range supported by `time` travel as text
#[cfg(feature = "chrono")]
impl AsValue for chrono::NaiveDate {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        chrono_date(&self)
            .map(|v| Value::Date(Some(v)))
            .unwrap_or_else(|| Value::Unknown(Some(self.to_string())))
    }
}

#[cfg(feature = "chrono")]
impl AsValue for chrono::NaiveTime {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        chrono_time(&self)
            .map(|v| Value::Time(Some(v)))
            .unwrap_or_else(|| Value::Unknown(Some(self.to_string())))
    }
}

#[cfg(feature = "chrono")]
impl AsValue for chrono::NaiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        chrono_date(&self.date())
            .zip(chrono_time(&self.time()))
            .map(|(date, time)| Value::Timestamp(Some(PrimitiveDateTime::new(date, time))))
            .unwrap_or_else(|| Value::Unknown(Some(self.to_string())))
    }
}

#[cfg(feature = "chrono")]
impl FromValue for chrono::NaiveDate {
    fn try_from_value(value: Value) -> Result<Self> {
        let date = Date::try_from_value(value)?;
        chrono::NaiveDate::from_ymd_opt(date.year(), date.month() as _, date.day() as _)
            .ok_or_else(|| Error::msg(format!("Date {date} is out of range for chrono")))
    }
}

#[cfg(feature = "chrono")]
impl FromValue for chrono::NaiveDateTime {
    fn try_from_value(value: Value) -> Result<Self> {
        let v = PrimitiveDateTime::try_from_value(value)?;
        chrono::NaiveDate::from_ymd_opt(v.year(), v.month() as _, v.day() as _)
            .and_then(|d| {
                d.and_hms_nano_opt(v.hour() as _, v.minute() as _, v.second() as _, v.nanosecond())
            })
            .ok_or_else(|| Error::msg(format!("Timestamp {v} is out of range for chrono")))
    }
}
