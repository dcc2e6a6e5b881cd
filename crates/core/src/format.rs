//! `printf`-style interpolation for effect templates.
//!
//! Templates are written against a fixed, positional argument list, so the
//! directives follow the `%[index$][flags][width][.precision]conversion`
//! shape: `%2$.0f`, `%<s`, `%d`, `%%` and `%n` are all accepted. Rounding is
//! half-up on the shortest decimal form of the value.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
    Float(f64),
    Int(i64),
    Text(Option<String>),
}

impl FormatArg {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "a float",
            Self::Int(_) => "an integer",
            Self::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown conversion '{0}'")]
    UnknownConversion(char),
    #[error("missing argument for '{0}'")]
    MissingArgument(String),
    #[error("conversion '{conversion}' cannot format {kind}")]
    Mismatch {
        conversion: char,
        kind: &'static str,
    },
    #[error("incomplete format specifier '{0}'")]
    Truncated(String),
}

#[derive(Debug, Default)]
struct Flags {
    left: bool,
    alternate: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
    paren: bool,
}

#[derive(Debug)]
enum ArgRef {
    Next,
    Explicit(usize),
    Previous,
}

#[derive(Debug)]
struct Spec {
    arg: ArgRef,
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

pub fn format_template(fmt: &str, args: &[FormatArg]) -> Result<String, FormatError> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut out = String::with_capacity(fmt.len() + 16);
    let mut pos = 0;
    let mut next_ordinary = 0;
    let mut last: Option<usize> = None;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch != '%' {
            out.push(ch);
            pos += 1;
            continue;
        }
        let start = pos;
        let spec = parse_spec(&chars, &mut pos)
            .ok_or_else(|| FormatError::Truncated(chars[start..].iter().collect()))?;
        let raw: String = chars[start..pos].iter().collect();

        match spec.conversion {
            '%' => {
                out.push_str(&pad("%".to_string(), &spec));
                continue;
            }
            'n' => {
                out.push('\n');
                continue;
            }
            _ => {}
        }

        let index = match spec.arg {
            ArgRef::Next => {
                next_ordinary += 1;
                next_ordinary - 1
            }
            ArgRef::Explicit(n) => n.checked_sub(1).ok_or(FormatError::MissingArgument(raw.clone()))?,
            ArgRef::Previous => last.ok_or(FormatError::MissingArgument(raw.clone()))?,
        };
        let arg = args
            .get(index)
            .ok_or_else(|| FormatError::MissingArgument(raw.clone()))?;
        last = Some(index);
        out.push_str(&convert(arg, &spec)?);
    }

    Ok(out)
}

/// Rewrites every ordinary directive (`%s`, `%.0f`, ...) into its explicit
/// positional form (`%1$s`, `%2$.0f`, ...), numbering them in reading order.
///
/// Templates pin their argument positions this way before alternative
/// clauses are cut out of the text, so a directive keeps the argument it had
/// in the full template.
pub fn pin_ordinary_indices(fmt: &str) -> String {
    let chars: Vec<char> = fmt.chars().collect();
    let mut out = String::with_capacity(fmt.len() + 8);
    let mut pos = 0;
    let mut ordinary = 0;

    while pos < chars.len() {
        if chars[pos] != '%' {
            out.push(chars[pos]);
            pos += 1;
            continue;
        }
        let start = pos;
        let Some(spec) = parse_spec(&chars, &mut pos) else {
            out.extend(&chars[start..]);
            break;
        };
        let pinnable = matches!(spec.arg, ArgRef::Next) && !matches!(spec.conversion, '%' | 'n');
        if pinnable {
            ordinary += 1;
            out.push_str(&format!("%{}$", ordinary));
            out.extend(&chars[start + 1..pos]);
        } else {
            out.extend(&chars[start..pos]);
        }
    }
    out
}

/// `%.{precision}f` of a single value.
pub fn format_fixed(value: f64, precision: usize) -> String {
    let spec = Spec {
        arg: ArgRef::Next,
        flags: Flags::default(),
        width: None,
        precision: Some(precision),
        conversion: 'f',
    };
    float(value, &spec)
}

fn parse_spec(chars: &[char], pos: &mut usize) -> Option<Spec> {
    let mut i = *pos + 1;

    let mut arg = ArgRef::Next;
    if chars.get(i) == Some(&'<') {
        arg = ArgRef::Previous;
        i += 1;
    } else {
        let digits_end = scan_digits(chars, i);
        if digits_end > i && chars.get(digits_end) == Some(&'$') {
            arg = ArgRef::Explicit(to_number(&chars[i..digits_end]));
            i = digits_end + 1;
        }
    }

    let mut flags = Flags::default();
    while let Some(ch) = chars.get(i) {
        match ch {
            '-' => flags.left = true,
            '#' => flags.alternate = true,
            '+' => flags.plus = true,
            ' ' => flags.space = true,
            '0' => flags.zero = true,
            ',' => flags.group = true,
            '(' => flags.paren = true,
            _ => break,
        }
        i += 1;
    }

    let width_end = scan_digits(chars, i);
    let width = (width_end > i).then(|| to_number(&chars[i..width_end]));
    i = width_end;

    let mut precision = None;
    if chars.get(i) == Some(&'.') {
        let precision_end = scan_digits(chars, i + 1);
        if precision_end == i + 1 {
            return None;
        }
        precision = Some(to_number(&chars[i + 1..precision_end]));
        i = precision_end;
    }

    let conversion = *chars.get(i)?;
    *pos = i + 1;
    Some(Spec {
        arg,
        flags,
        width,
        precision,
        conversion,
    })
}

fn scan_digits(chars: &[char], from: usize) -> usize {
    let mut end = from;
    while chars.get(end).is_some_and(char::is_ascii_digit) {
        end += 1;
    }
    end
}

fn to_number(digits: &[char]) -> usize {
    digits
        .iter()
        .filter_map(|c| c.to_digit(10))
        .fold(0usize, |acc, d| acc.saturating_mul(10).saturating_add(d as usize))
}

fn convert(arg: &FormatArg, spec: &Spec) -> Result<String, FormatError> {
    let mismatch = || FormatError::Mismatch {
        conversion: spec.conversion,
        kind: arg.kind(),
    };
    let text = match spec.conversion {
        's' | 'S' => {
            let mut text = match arg {
                FormatArg::Float(value) => double_to_string(*value),
                FormatArg::Int(value) => value.to_string(),
                FormatArg::Text(value) => value.clone().unwrap_or_else(|| "null".to_string()),
            };
            if let Some(precision) = spec.precision {
                text = text.chars().take(precision).collect();
            }
            if spec.conversion == 'S' {
                text = text.to_uppercase();
            }
            pad(text, spec)
        }
        'b' | 'B' => {
            let text = match arg {
                FormatArg::Text(None) => "false",
                _ => "true",
            };
            let text = if spec.conversion == 'B' {
                text.to_uppercase()
            } else {
                text.to_string()
            };
            pad(text, spec)
        }
        'c' => match arg {
            FormatArg::Int(value) => {
                let ch = u32::try_from(*value)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(mismatch)?;
                pad(ch.to_string(), spec)
            }
            _ => return Err(mismatch()),
        },
        'd' => match arg {
            FormatArg::Int(value) => {
                let digits = group_digits(&value.unsigned_abs().to_string(), spec.flags.group);
                signed(digits, *value < 0, spec)
            }
            _ => return Err(mismatch()),
        },
        'x' | 'X' => match arg {
            FormatArg::Int(value) => {
                let mut text = format!("{:x}", value);
                if spec.flags.alternate {
                    text.insert_str(0, "0x");
                }
                if spec.conversion == 'X' {
                    text = text.to_uppercase();
                }
                pad_numeric(text, spec)
            }
            _ => return Err(mismatch()),
        },
        'f' | 'e' | 'E' | 'g' | 'G' => match arg {
            FormatArg::Float(value) => float(*value, spec),
            _ => return Err(mismatch()),
        },
        other => return Err(FormatError::UnknownConversion(other)),
    };
    Ok(text)
}

fn float(value: f64, spec: &Spec) -> String {
    if value.is_nan() {
        return pad("NaN".to_string(), spec);
    }
    if value.is_infinite() {
        let text = if value > 0.0 {
            if spec.flags.plus {
                "+Infinity"
            } else {
                "Infinity"
            }
        } else if spec.flags.paren {
            "(Infinity)"
        } else {
            "-Infinity"
        };
        return pad(text.to_string(), spec);
    }

    let negative = value.is_sign_negative() && value != 0.0;
    let magnitude = value.abs();
    let precision = spec.precision.unwrap_or(6);
    let body = match spec.conversion {
        'f' => {
            let fixed = round_half_up(&plain_decimal(magnitude), precision);
            group_fixed(&fixed, spec.flags.group)
        }
        'e' | 'E' => {
            let text = scientific(magnitude, precision);
            if spec.conversion == 'E' {
                text.to_uppercase()
            } else {
                text
            }
        }
        _ => {
            let text = general(magnitude, precision, spec.flags.group);
            if spec.conversion == 'G' {
                text.to_uppercase()
            } else {
                text
            }
        }
    };
    signed(body, negative, spec)
}

fn general(magnitude: f64, precision: usize, group: bool) -> String {
    let precision = precision.max(1);
    if magnitude == 0.0 {
        return round_half_up("0", precision - 1);
    }
    let rounded: f64 = scientific(magnitude, precision - 1)
        .parse()
        .unwrap_or(magnitude);
    let upper = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    if (1e-4..upper).contains(&rounded) {
        let exponent = rounded.log10().floor() as i64;
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        group_fixed(&round_half_up(&plain_decimal(magnitude), decimals), group)
    } else {
        scientific(magnitude, precision - 1)
    }
}

/// Shortest round-trip decimal digits of `value`, never in exponent form.
fn plain_decimal(value: f64) -> String {
    format!("{}", value)
}

/// Rounds a plain decimal string to `precision` fraction digits, half up.
fn round_half_up(decimal: &str, precision: usize) -> String {
    let (int_part, frac_part) = decimal.split_once('.').unwrap_or((decimal, ""));
    let mut digits: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    let frac: Vec<u8> = frac_part.bytes().map(|b| b - b'0').collect();
    let round_up = frac.get(precision).is_some_and(|d| *d >= 5);
    digits.extend((0..precision).map(|i| frac.get(i).copied().unwrap_or(0)));

    if round_up {
        let mut idx = digits.len();
        loop {
            if idx == 0 {
                digits.insert(0, 1);
                break;
            }
            idx -= 1;
            if digits[idx] == 9 {
                digits[idx] = 0;
            } else {
                digits[idx] += 1;
                break;
            }
        }
    }

    let split = digits.len() - precision;
    let mut out: String = digits[..split].iter().map(|d| char::from(b'0' + d)).collect();
    if out.is_empty() {
        out.push('0');
    }
    if precision > 0 {
        out.push('.');
        out.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    }
    out
}

fn scientific(magnitude: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.abs())
}

/// The textual form a double takes when printed with `%s`.
pub fn double_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = format!("{}", value);
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    } else {
        let text = format!("{:e}", value);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        if mantissa.contains('.') {
            format!("{}E{}", mantissa, exponent)
        } else {
            format!("{}.0E{}", mantissa, exponent)
        }
    }
}

fn group_digits(digits: &str, group: bool) -> String {
    if !group || digits.len() <= 3 {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn group_fixed(fixed: &str, group: bool) -> String {
    match fixed.split_once('.') {
        Some((int_part, frac)) => format!("{}.{}", group_digits(int_part, group), frac),
        None => group_digits(fixed, group),
    }
}

fn signed(body: String, negative: bool, spec: &Spec) -> String {
    let (prefix, suffix) = if negative {
        if spec.flags.paren {
            ("(", ")")
        } else {
            ("-", "")
        }
    } else if spec.flags.plus {
        ("+", "")
    } else if spec.flags.space {
        (" ", "")
    } else {
        ("", "")
    };
    let width = spec.width.unwrap_or(0);
    let len = prefix.len() + body.chars().count() + suffix.len();
    if spec.flags.zero && !spec.flags.left && len < width {
        let zeros = "0".repeat(width - len);
        format!("{}{}{}{}", prefix, zeros, body, suffix)
    } else {
        pad(format!("{}{}{}", prefix, body, suffix), spec)
    }
}

fn pad_numeric(text: String, spec: &Spec) -> String {
    let width = spec.width.unwrap_or(0);
    let len = text.chars().count();
    if spec.flags.zero && !spec.flags.left && len < width {
        format!("{}{}", "0".repeat(width - len), text)
    } else {
        pad(text, spec)
    }
}

fn pad(text: String, spec: &Spec) -> String {
    let width = spec.width.unwrap_or(0);
    let len = text.chars().count();
    if len >= width {
        return text;
    }
    let fill = " ".repeat(width - len);
    if spec.flags.left {
        format!("{}{}", text, fill)
    } else {
        format!("{}{}", fill, text)
    }
}
