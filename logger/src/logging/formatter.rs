//! 메시지 포매터
//!
//! printf 스타일 템플릿 치환과 로그 파일 한 줄의 형식화를 담당합니다.

use chrono::{DateTime, Local};

use crate::error::FormatError;
use crate::logging::args::{ArgValue, FormatArg};
use crate::logging::level::Severity;

/// 로그 파일 타임스탬프 형식 (`yyyy-MM-dd HH:mm:ss.SSS`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 템플릿에 인자를 치환
///
/// 인자가 없으면 템플릿을 그대로 반환하므로 `%`가 들어 있는 문자열도 안전합니다.
///
/// 지정자 형식은 `%[위치$][플래그][폭][.정밀도]변환` 입니다.
/// - 위치: `2$` (1부터 시작), 플래그 `<` 는 직전 인자를 다시 사용
/// - 플래그: `-` 왼쪽 정렬, `0` 0 채움, `+` 부호, ` ` 양수 앞 공백,
///   `,` 천 단위 구분, `#` 진법 접두사, `(` 음수를 괄호로
/// - 변환: `s S b B c C d i o x X f e E`, 인자 없는 `%%`, `%n`
pub fn format_message(template: &str, args: &[&dyn FormatArg]) -> Result<String, FormatError> {
    if args.is_empty() {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut used = vec![false; args.len()];
    let mut next_index = 0usize;
    let mut last_index: Option<usize> = None;
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let (spec, consumed) = Spec::parse(&rest[pos + 1..])?;
        let text = &rest[pos..pos + 1 + consumed];
        rest = &rest[pos + 1 + consumed..];
        spec.validate(text)?;

        match spec.conversion {
            '%' => {
                out.push_str(&spec.pad(String::from("%")));
                continue;
            }
            'n' => {
                out.push('\n');
                continue;
            }
            _ => {}
        }

        let index = match spec.index {
            ArgIndex::Ordinary => {
                let index = next_index;
                next_index += 1;
                index
            }
            ArgIndex::Explicit(index) => index,
            ArgIndex::Previous => last_index.ok_or_else(|| FormatError::IllegalSpecifier {
                specifier: text.to_string(),
            })?,
        };
        let arg = args.get(index).ok_or(FormatError::MissingArgument {
            position: index + 1,
            supplied: args.len(),
        })?;
        used[index] = true;
        last_index = Some(index);

        let value = arg.format_value();
        let formatted = spec.convert(value).ok_or(FormatError::ArgumentMismatch {
            conversion: spec.conversion,
            position: index + 1,
        })?;
        out.push_str(&formatted);
    }
    out.push_str(rest);

    let used_count = used.iter().filter(|u| **u).count();
    if used_count < args.len() {
        return Err(FormatError::UnusedArguments {
            used: used_count,
            supplied: args.len(),
        });
    }

    Ok(out)
}

/// 인자 선택 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgIndex {
    Ordinary,
    Explicit(usize),
    Previous,
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    left: bool,
    alternate: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
    paren: bool,
}

/// 파싱된 지정자 하나
#[derive(Debug, Clone, Copy)]
struct Spec {
    index: ArgIndex,
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

/// 연속된 숫자를 읽어 (값, 다음 위치) 반환
fn scan_number(bytes: &[u8], start: usize) -> (Option<usize>, usize) {
    let end = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |n| start + n);
    let value = std::str::from_utf8(&bytes[start..end])
        .ok()
        .and_then(|digits| digits.parse().ok());
    (value, end)
}

impl Spec {
    /// `%` 다음 문자열에서 지정자를 읽고 소비한 바이트 수를 함께 반환
    fn parse(input: &str) -> Result<(Self, usize), FormatError> {
        let bytes = input.as_bytes();
        let illegal = |end: usize| FormatError::IllegalSpecifier {
            specifier: format!("%{}", &input[..end.min(input.len())]),
        };

        let mut i = 0;
        let mut index = ArgIndex::Ordinary;

        let (number, end) = scan_number(bytes, i);
        if end > i && bytes.get(end) == Some(&b'$') {
            match number {
                Some(position) if position > 0 => index = ArgIndex::Explicit(position - 1),
                _ => return Err(illegal(end + 1)),
            }
            i = end + 1;
        }

        let mut flags = Flags::default();
        while let Some(&b) = bytes.get(i) {
            let slot = match b {
                b'-' => &mut flags.left,
                b'#' => &mut flags.alternate,
                b'+' => &mut flags.plus,
                b' ' => &mut flags.space,
                b'0' => &mut flags.zero,
                b',' => &mut flags.group,
                b'(' => &mut flags.paren,
                b'<' if index == ArgIndex::Ordinary => {
                    index = ArgIndex::Previous;
                    i += 1;
                    continue;
                }
                _ => break,
            };
            if *slot {
                return Err(illegal(i + 1));
            }
            *slot = true;
            i += 1;
        }

        let (width, end) = scan_number(bytes, i);
        i = end;

        let mut precision = None;
        if bytes.get(i) == Some(&b'.') {
            let (value, end) = scan_number(bytes, i + 1);
            if value.is_none() {
                return Err(illegal(end));
            }
            precision = value;
            i = end;
        }

        let conversion = input[i..].chars().next().ok_or(FormatError::DanglingPercent)?;
        if !matches!(
            conversion,
            '%' | 'n' | 's' | 'S' | 'b' | 'B' | 'c' | 'C' | 'd' | 'i' | 'o' | 'x' | 'X' | 'f'
                | 'e' | 'E'
        ) {
            return Err(FormatError::UnknownConversion(conversion));
        }

        let spec = Self {
            index,
            flags,
            width,
            precision,
            conversion,
        };
        Ok((spec, i + conversion.len_utf8()))
    }

    /// 변환과 플래그 조합 검증
    fn validate(&self, text: &str) -> Result<(), FormatError> {
        let f = self.flags;
        let numeric = f.plus || f.space || f.zero || f.group || f.paren;

        let allowed = match self.conversion {
            'n' => {
                !numeric
                    && !f.left
                    && !f.alternate
                    && self.width.is_none()
                    && self.precision.is_none()
            }
            '%' => !numeric && !f.alternate && self.precision.is_none(),
            's' | 'S' | 'b' | 'B' => !numeric && !f.alternate,
            'c' | 'C' => !numeric && !f.alternate && self.precision.is_none(),
            'd' | 'i' => !f.alternate && self.precision.is_none(),
            'o' | 'x' | 'X' => {
                !(f.plus || f.space || f.group || f.paren) && self.precision.is_none()
            }
            'f' => !f.alternate,
            'e' | 'E' => !f.alternate && !f.group,
            _ => false,
        };

        let consistent = !(f.left && f.zero)
            && !(f.plus && f.space)
            && ((!f.left && !f.zero) || self.width.is_some());

        if allowed && consistent {
            Ok(())
        } else {
            Err(FormatError::IllegalSpecifier {
                specifier: text.to_string(),
            })
        }
    }

    /// 인자 하나를 변환. 타입이 맞지 않으면 `None`
    fn convert(&self, value: ArgValue<'_>) -> Option<String> {
        let upper = self.conversion.is_ascii_uppercase();

        let text = match (self.conversion.to_ascii_lowercase(), value) {
            ('b', value) => {
                let truth = match value {
                    ArgValue::Null => false,
                    ArgValue::Bool(b) => b,
                    _ => true,
                };
                self.truncate(truth.to_string())
            }
            (_, ArgValue::Null) => self.truncate(String::from("null")),
            ('s', value) => self.truncate(plain_text(value)),
            ('c', ArgValue::Char(c)) => c.to_string(),
            ('c', ArgValue::Signed { value, .. }) => {
                char::from_u32(u32::try_from(value).ok()?)?.to_string()
            }
            ('c', ArgValue::Unsigned(value)) => {
                char::from_u32(u32::try_from(value).ok()?)?.to_string()
            }
            ('d' | 'i', value) => {
                let (negative, magnitude) = integer_parts(value)?;
                let mut digits = magnitude.to_string();
                if self.flags.group {
                    digits = group_thousands(&digits);
                }
                return Some(self.finish_signed(negative, digits));
            }
            ('o' | 'x', value) => {
                let bits = match value {
                    ArgValue::Signed { value, bits } if value < 0 => {
                        let mask = if bits >= 128 { u128::MAX } else { (1u128 << bits) - 1 };
                        (value as u128) & mask
                    }
                    ArgValue::Signed { value, .. } => value as u128,
                    ArgValue::Unsigned(value) => value,
                    _ => return None,
                };
                let (prefix, digits) = if self.conversion == 'o' {
                    ("0", format!("{bits:o}"))
                } else {
                    ("0x", format!("{bits:x}"))
                };
                let prefix = if self.flags.alternate { prefix } else { "" };
                let text = self.zero_fill(prefix, &digits, "");
                return Some(self.pad(if upper { text.to_uppercase() } else { text }));
            }
            ('f' | 'e', value) => {
                let number = float_value(value)?;
                if !number.is_finite() {
                    let text = if number.is_nan() {
                        String::from("NaN")
                    } else if number < 0.0 {
                        String::from(if self.flags.paren { "(Infinity)" } else { "-Infinity" })
                    } else if self.flags.plus {
                        String::from("+Infinity")
                    } else {
                        String::from("Infinity")
                    };
                    return Some(self.pad(text));
                }
                let precision = self.precision.unwrap_or(6);
                let magnitude = number.abs();
                let digits = if self.conversion == 'f' {
                    let fixed = format!("{magnitude:.precision$}");
                    if self.flags.group {
                        group_fraction(&fixed)
                    } else {
                        fixed
                    }
                } else {
                    scientific(magnitude, precision, upper)
                };
                return Some(self.finish_signed(number.is_sign_negative(), digits));
            }
            _ => return None,
        };

        Some(self.pad(if upper { text.to_uppercase() } else { text }))
    }

    /// 정밀도만큼 문자 수를 자름
    fn truncate(&self, text: String) -> String {
        match self.precision {
            Some(limit) if text.chars().count() > limit => text.chars().take(limit).collect(),
            _ => text,
        }
    }

    /// 부호 처리 후 0 채움과 폭 맞춤
    fn finish_signed(&self, negative: bool, digits: String) -> String {
        let (prefix, suffix) = match (negative, self.flags) {
            (true, Flags { paren: true, .. }) => ("(", ")"),
            (true, _) => ("-", ""),
            (false, Flags { plus: true, .. }) => ("+", ""),
            (false, Flags { space: true, .. }) => (" ", ""),
            (false, _) => ("", ""),
        };
        let text = self.zero_fill(prefix, &digits, suffix);
        self.pad(text)
    }

    /// `0` 플래그가 있으면 접두사와 숫자 사이를 0으로 채움
    fn zero_fill(&self, prefix: &str, digits: &str, suffix: &str) -> String {
        let len = prefix.len() + digits.chars().count() + suffix.len();
        let zeros = match self.width {
            Some(width) if self.flags.zero && width > len => width - len,
            _ => 0,
        };
        format!("{prefix}{}{digits}{suffix}", "0".repeat(zeros))
    }

    /// 폭에 맞춰 공백 정렬
    fn pad(&self, text: String) -> String {
        let len = text.chars().count();
        match self.width {
            Some(width) if width > len => {
                let fill = " ".repeat(width - len);
                if self.flags.left {
                    text + &fill
                } else {
                    fill + &text
                }
            }
            _ => text,
        }
    }
}

/// `%s` 출력 문자열
fn plain_text(value: ArgValue<'_>) -> String {
    match value {
        ArgValue::Signed { value, .. } => value.to_string(),
        ArgValue::Unsigned(value) => value.to_string(),
        ArgValue::Float(value) => format!("{value:?}"),
        ArgValue::Bool(value) => value.to_string(),
        ArgValue::Char(value) => value.to_string(),
        ArgValue::Str(value) => value.to_string(),
        ArgValue::Display(value) => value.to_string(),
        ArgValue::Null => String::from("null"),
    }
}

fn integer_parts(value: ArgValue<'_>) -> Option<(bool, u128)> {
    match value {
        ArgValue::Signed { value, .. } => Some((value < 0, value.unsigned_abs())),
        ArgValue::Unsigned(value) => Some((false, value)),
        _ => None,
    }
}

fn float_value(value: ArgValue<'_>) -> Option<f64> {
    match value {
        ArgValue::Float(value) => Some(value),
        ArgValue::Signed { value, .. } => Some(value as f64),
        ArgValue::Unsigned(value) => Some(value as f64),
        _ => None,
    }
}

/// `1234567` → `1,234,567`
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn group_fraction(fixed: &str) -> String {
    match fixed.split_once('.') {
        Some((whole, fraction)) => format!("{}.{fraction}", group_thousands(whole)),
        None => group_thousands(fixed),
    }
}

/// `1.234560e+01` 형식 (지수는 최소 두 자리)
fn scientific(magnitude: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{magnitude:.precision$e}");
    let text = match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => raw,
    };
    if upper {
        text.to_uppercase()
    } else {
        text
    }
}

/// 한 번의 로그 호출로 만들어지는 이벤트 (보관하지 않음)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// 심각도
    pub severity: Severity,
    /// 호출 위치가 포함된 최종 태그
    pub tag: String,
    /// 치환이 끝난 메시지
    pub message: String,
}

impl LogEvent {
    /// 템플릿을 치환해 새 이벤트 생성
    pub fn new(
        severity: Severity,
        tag: String,
        template: &str,
        args: &[&dyn FormatArg],
    ) -> Result<Self, FormatError> {
        Ok(Self {
            severity,
            tag,
            message: format_message(template, args)?,
        })
    }

    /// 현재 로컬 시간으로 로그 파일 한 줄 생성
    pub fn to_line(&self) -> String {
        self.to_line_at(Local::now())
    }

    /// `<타임스탬프>\t<약어>/<태그>\t<메시지>` 형식의 한 줄 (개행 제외)
    pub fn to_line_at(&self, timestamp: DateTime<Local>) -> String {
        format!(
            "{}\t{}/{}\t{}",
            timestamp.format(TIMESTAMP_FORMAT),
            self.severity.abbr(),
            self.tag,
            self.message
        )
    }
}
