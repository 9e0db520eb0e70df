/// Declares a transparent newtype around a native integer with a set of named constants.
///
/// The generated type gets `from_raw`/`raw` accessors and a private variant name lookup used by
/// the `Debug` and `FromStr` impls.
macro_rules! ffi_enum {
    (
        $( #[$attrs:meta] )*
        $v:vis enum $name:ident: $native:ty {
            $(
                $( #[$variant_attrs:meta] )*
                $variant:ident = $value:expr
            ),+
            $(,)?
        }
    ) => {
        $( #[$attrs] )*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $v struct $name(pub(crate) $native);

        impl $name {
            $(
                $( #[$variant_attrs] )*
                $v const $variant: Self = Self($value);
            )+

            #[inline]
            pub const fn from_raw(raw: $native) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> $native {
                self.0
            }

            #[allow(dead_code, unreachable_patterns)]
            fn variant_name(&self) -> Option<&'static str> {
                match self {
                    $(
                        &Self::$variant => Some(stringify!($variant)),
                    )*
                    _ => None,
                }
            }

            #[allow(dead_code)]
            fn from_variant_name(name: &str) -> Option<Self> {
                match name {
                    $(
                        stringify!($variant) => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }
        }
    };
}

/// Implements `Debug` and `FromStr` for an event code type, using the C constant prefix.
macro_rules! code_names {
    ($type:ident, $prefix:literal) => {
        impl $type {
            pub(crate) fn name(self) -> Option<$crate::event::codes::VariantName> {
                Some($crate::event::codes::VariantName::new(
                    $prefix,
                    self.variant_name()?,
                ))
            }
        }

        impl ::std::str::FromStr for $type {
            type Err = $crate::event::codes::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix($prefix)
                    .and_then(Self::from_variant_name)
                    .ok_or($crate::event::codes::UnknownVariant::new())
            }
        }

        impl ::std::fmt::Debug for $type {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.name() {
                    Some(name) => ::std::fmt::Display::fmt(&name, f),
                    None => write!(f, concat!(stringify!($type), "({:#x})"), self.0),
                }
            }
        }
    };
}

/// Makes a code type usable as a [`BitSet`][crate::bits::BitSet] element.
///
/// The type must have a `MAX` associated constant naming the largest code.
macro_rules! bitvalue {
    ($type:ty) => {
        impl $crate::bits::BitValueImpl for $type {
            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index as _)
            }
            #[inline]
            fn into_index(self) -> usize {
                self.0 as _
            }
        }
        impl $crate::bits::BitValue for $type {
            const MAX: Self = <Self>::MAX;
        }
    };
}

/// Emits a message through a [`LogContext`][crate::logging::LogContext] at the given priority.
macro_rules! dev_log {
    ($ctx:expr, $prio:ident, $($arg:tt)+) => {
        $ctx.log($crate::logging::LogPriority::$prio, format_args!($($arg)+))
    };
}

/// Reports a programming error on the caller's side.
///
/// These are always logged at [`LogPriority::Error`][crate::logging::LogPriority::Error] and
/// carry a `BUG: ` prefix.
macro_rules! log_bug {
    ($ctx:expr, $($arg:tt)+) => {
        $ctx.log(
            $crate::logging::LogPriority::Error,
            format_args!("BUG: {}", format_args!($($arg)+)),
        )
    };
}
