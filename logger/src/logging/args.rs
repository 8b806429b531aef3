//! 포맷 인자
//!
//! `%x`, `%.2f`, `%c` 같은 변환은 인자의 실제 타입을 알아야 하므로
//! 인자를 `Display`가 아닌 [`FormatArg`]로 받습니다.

use std::borrow::Cow;
use std::fmt::{self, Display};

/// 변환에 사용되는 인자 값
#[derive(Clone, Copy)]
pub enum ArgValue<'a> {
    /// 부호 있는 정수와 원래 비트 폭 (`%x`의 2의 보수 표현에 사용)
    Signed { value: i128, bits: u32 },
    /// 부호 없는 정수
    Unsigned(u128),
    /// 부동소수점
    Float(f64),
    Bool(bool),
    Char(char),
    Str(&'a str),
    /// 그 밖의 `Display` 값
    Display(&'a dyn Display),
    /// 값 없음 (`None`), `"null"`로 출력
    Null,
}

impl fmt::Debug for ArgValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Signed { value, bits } => write!(f, "Signed({value}, i{bits})"),
            ArgValue::Unsigned(v) => write!(f, "Unsigned({v})"),
            ArgValue::Float(v) => write!(f, "Float({v:?})"),
            ArgValue::Bool(v) => write!(f, "Bool({v})"),
            ArgValue::Char(v) => write!(f, "Char({v:?})"),
            ArgValue::Str(v) => write!(f, "Str({v:?})"),
            ArgValue::Display(v) => write!(f, "Display({v})"),
            ArgValue::Null => f.write_str("Null"),
        }
    }
}

/// 로그 메시지 인자로 쓸 수 있는 타입
///
/// 정수, 실수, `bool`, `char`, 문자열, `Option`에 구현되어 있습니다.
/// 다른 `Display` 타입은 [`display`]로 감싸서 넘깁니다.
pub trait FormatArg {
    fn format_value(&self) -> ArgValue<'_>;
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl FormatArg for $t {
            fn format_value(&self) -> ArgValue<'_> {
                ArgValue::Signed { value: *self as i128, bits: <$t>::BITS }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl FormatArg for $t {
            fn format_value(&self) -> ArgValue<'_> {
                ArgValue::Unsigned(*self as u128)
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);

impl FormatArg for f32 {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Float(*self as f64)
    }
}

impl FormatArg for f64 {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Float(*self)
    }
}

impl FormatArg for bool {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Bool(*self)
    }
}

impl FormatArg for char {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Char(*self)
    }
}

impl FormatArg for str {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Str(self)
    }
}

impl FormatArg for String {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Str(self)
    }
}

impl FormatArg for Cow<'_, str> {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Str(self)
    }
}

impl FormatArg for fmt::Arguments<'_> {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Display(self)
    }
}

impl<T: FormatArg> FormatArg for Option<T> {
    fn format_value(&self) -> ArgValue<'_> {
        match self {
            Some(value) => value.format_value(),
            None => ArgValue::Null,
        }
    }
}

impl<T: FormatArg + ?Sized> FormatArg for &T {
    fn format_value(&self) -> ArgValue<'_> {
        (**self).format_value()
    }
}

/// 임의의 `Display` 값을 감싼 인자
#[derive(Debug, Clone, Copy)]
pub struct DisplayArg<T>(pub T);

impl<T: Display> FormatArg for DisplayArg<T> {
    fn format_value(&self) -> ArgValue<'_> {
        ArgValue::Display(&self.0)
    }
}

/// `Display` 값을 문자열 인자로 감쌈
///
/// ```
/// use tagged_logger::logging::args::display;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/app.log");
/// let arg = display(path.display());
/// # let _ = arg;
/// ```
pub fn display<T: Display>(value: T) -> DisplayArg<T> {
    DisplayArg(value)
}
