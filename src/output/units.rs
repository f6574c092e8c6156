//! Compact, unit-scaled rendering of durations, byte counts and counters

use log::warn;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;
const BILLION: f64 = 1_000_000_000.0;

/// A value that can be rendered as a magnitude.
///
/// Every aggregate ends up as an `f64`; this trait lets the formatters take
/// counters, floats and references to either without conversions at the
/// call site. An absent value (`None`) is reported and rendered as zero.
pub trait Magnitude {
    fn magnitude(&self) -> f64;
}

macro_rules! impl_magnitude {
    ($($t:ty),*) => {
        $(
            impl Magnitude for $t {
                fn magnitude(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

impl_magnitude!(f64, f32, u64, u32, usize, i64, i32);

impl<T: Magnitude + ?Sized> Magnitude for &T {
    fn magnitude(&self) -> f64 {
        (**self).magnitude()
    }
}

impl<T: Magnitude> Magnitude for Option<T> {
    fn magnitude(&self) -> f64 {
        match self {
            Some(v) => v.magnitude(),
            None => {
                warn!("missing value rendered as 0");
                0.0
            }
        }
    }
}

/// Unit ladder used to render a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Seconds, scaled down to ms/µs/ns
    Duration,
    /// Bytes with two decimals (k/M/G at powers of 1024)
    Bytes,
    /// Bytes without decimals
    WholeBytes,
    /// Counter with two decimals (k/M/G at powers of 1000)
    Count,
    /// Counter without decimals below 1000
    WholeCount,
}

impl Unit {
    pub fn format(self, v: impl Magnitude) -> String {
        match self {
            Unit::Duration => short_time(v),
            Unit::Bytes => short_byte(v),
            Unit::WholeBytes => short_byte_int(v),
            Unit::Count => short(v),
            Unit::WholeCount => short_int(v),
        }
    }

    /// Variant of the same ladder used for totals and extremes
    pub fn whole(self) -> Unit {
        match self {
            Unit::Bytes => Unit::WholeBytes,
            Unit::Count => Unit::WholeCount,
            other => other,
        }
    }
}

/// Render seconds with the largest unit that keeps the value above one
pub fn short_time(v: impl Magnitude) -> String {
    let f = v.magnitude();
    if f < 0.000_000_001 {
        format!("{:.0}", f)
    } else if f < 0.000_001 {
        format!("{:.1}ns", f * BILLION)
    } else if f < 0.001 {
        format!("{:.1}µs", f * MILLION)
    } else if f < 1.0 {
        format!("{:.1}ms", f * THOUSAND)
    } else {
        format!("{:.2}s", f)
    }
}

/// Render a byte count without decimals
pub fn short_byte_int(v: impl Magnitude) -> String {
    let f = v.magnitude();
    if f >= GIB {
        format!("{:.0}G", f / GIB)
    } else if f >= MIB {
        format!("{:.0}M", f / MIB)
    } else if f >= KIB {
        format!("{:.0}k", f / KIB)
    } else {
        format!("{:.0}", f)
    }
}

/// Render a byte count with two decimals; zero stays `0`
pub fn short_byte(v: impl Magnitude) -> String {
    let f = v.magnitude();
    if f >= GIB {
        format!("{:.2}G", f / GIB)
    } else if f >= MIB {
        format!("{:.2}M", f / MIB)
    } else if f >= KIB {
        format!("{:.2}k", f / KIB)
    } else if f == 0.0 {
        "0".to_string()
    } else {
        format!("{:.2}", f)
    }
}

/// Render a counter; values below 1000 have no decimals
pub fn short_int(v: impl Magnitude) -> String {
    let f = v.magnitude();
    if f >= BILLION {
        format!("{:.2}G", f / BILLION)
    } else if f >= MILLION {
        format!("{:.2}M", f / MILLION)
    } else if f >= THOUSAND {
        format!("{:.2}k", f / THOUSAND)
    } else {
        format!("{:.0}", f)
    }
}

/// Render a counter with two decimals; zero stays `0`
pub fn short(v: impl Magnitude) -> String {
    let f = v.magnitude();
    if f >= BILLION {
        format!("{:.2}G", f / BILLION)
    } else if f >= MILLION {
        format!("{:.2}M", f / MILLION)
    } else if f >= THOUSAND {
        format!("{:.2}k", f / THOUSAND)
    } else if f == 0.0 {
        "0".to_string()
    } else {
        format!("{:.2}", f)
    }
}

/// `a / b * 100`. A zero divisor yields `inf` or `NaN`.
pub fn percent(a: impl Magnitude, b: impl Magnitude) -> f64 {
    a.magnitude() / b.magnitude() * 100.0
}

/// `a / b`. A zero divisor yields `inf` or `NaN`.
pub fn per(a: impl Magnitude, b: impl Magnitude) -> f64 {
    a.magnitude() / b.magnitude()
}
