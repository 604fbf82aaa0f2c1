//! Number formatting shared by comparison rows and KPI tiles.

use serde::Serialize;

/// Fixed-point rendering without grouping.
///
/// A value that rounds to zero is printed unsigned, so `-0.3` becomes `"0"`.
pub fn fixed(x: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, x);
    if let Some(rest) = s.strip_prefix('-') {
        if rest.chars().all(|c| c == '0' || c == '.') {
            return rest.to_string();
        }
    }
    s
}

/// Fixed-point rendering with comma thousands separators.
pub fn grouped(x: f64, decimals: usize) -> String {
    let raw = fixed(x, decimals);
    if !x.is_finite() {
        return raw;
    }
    let (sign, body) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int, frac) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let mut out = String::with_capacity(raw.len() + int.len() / 3);
    out.push_str(sign);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// Whole-dollar currency, e.g. `$31,600,800`.
pub fn money0(x: f64) -> String {
    format!("${}", grouped(x, 0))
}

/// Currency with cents, e.g. `$350.25`.
pub fn money2(x: f64) -> String {
    format!("${}", grouped(x, 2))
}

/// How a metric's values are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    /// Hours and tons: grouped, no decimals, no symbol.
    Count,
    /// Totals in dollars, no decimals.
    Currency,
    /// Dollars per processed ton, two decimals.
    CurrencyPerTon,
    /// Percent of revenue; deltas are percentage points.
    Percent,
}

impl UnitClass {
    pub fn value(self, x: f64) -> String {
        match self {
            UnitClass::Count => grouped(x, 0),
            UnitClass::Currency => money0(x),
            UnitClass::CurrencyPerTon => money2(x),
            UnitClass::Percent => format!("{}%", fixed(x, 2)),
        }
    }

    pub fn delta(self, d: f64) -> String {
        match self {
            UnitClass::Percent => format!("{} pts", fixed(d, 2)),
            _ => self.value(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping() {
        assert_eq!(grouped(0.0, 0), "0");
        assert_eq!(grouped(999.0, 0), "999");
        assert_eq!(grouped(1_000.0, 0), "1,000");
        assert_eq!(grouped(63_201.6, 0), "63,202");
        assert_eq!(grouped(31_600_800.0, 0), "31,600,800");
        assert_eq!(grouped(-1_234_567.891, 2), "-1,234,567.89");
        assert_eq!(grouped(123_456.0, 0), "123,456");
    }

    #[test]
    fn negative_zero_is_unsigned() {
        assert_eq!(fixed(-0.3, 0), "0");
        assert_eq!(fixed(-0.001, 2), "0.00");
        assert_eq!(grouped(-0.0, 0), "0");
        assert_eq!(fixed(-0.6, 0), "-1");
    }

    #[test]
    fn money_formats() {
        assert_eq!(money0(21_536_800.0), "$21,536,800");
        assert_eq!(money0(-2_000_000.0), "$-2,000,000");
        assert_eq!(money2(120.0), "$120.00");
        assert_eq!(money2(1_350.25), "$1,350.25");
    }

    #[test]
    fn unit_classes() {
        assert_eq!(UnitClass::Percent.value(74.48165869218501), "74.48%");
        assert_eq!(UnitClass::Percent.delta(-1.5), "-1.50 pts");
        assert_eq!(UnitClass::Count.value(67_200.0), "67,200");
        assert_eq!(UnitClass::Count.delta(-560.0), "-560");
        assert_eq!(UnitClass::CurrencyPerTon.delta(0.0), "$0.00");
        assert_eq!(UnitClass::Currency.value(8_064_000.0), "$8,064,000");
    }

    #[test]
    fn non_finite_passes_through() {
        assert_eq!(grouped(f64::INFINITY, 0), "inf");
        assert_eq!(grouped(f64::NAN, 2), "NaN");
    }
}
