use std::{any::type_name, fmt, marker::PhantomData, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::event::{Abs, Key, Led, Misc, Rel, Sound, Switch};

/// Accepts either a constant name (`KEY_F1`) or a raw `u16` code.
struct CodeVisitor<T> {
    from_raw: fn(u16) -> T,
    _p: PhantomData<T>,
}

impl<'de, T: FromStr> de::Visitor<'de> for CodeVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("named variant or raw code")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        T::from_str(v).map_err(|_| {
            E::custom(format!(
                "unknown variant '{v}' for type '{}'",
                type_name::<T>()
            ))
        })
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        match u16::try_from(v) {
            Ok(raw) => Ok((self.from_raw)(raw)),
            Err(_) => Err(E::invalid_value(
                de::Unexpected::Unsigned(v),
                &"unsigned 16-bit value",
            )),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        match u16::try_from(v) {
            Ok(raw) => Ok((self.from_raw)(raw)),
            Err(_) => Err(E::invalid_value(
                de::Unexpected::Signed(v),
                &"unsigned 16-bit value",
            )),
        }
    }
}

fn deserialize_code<'de, D, T>(deserializer: D, from_raw: fn(u16) -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    if deserializer.is_human_readable() {
        // Human-readable formats are assumed to be self-describing.
        deserializer.deserialize_any(CodeVisitor {
            from_raw,
            _p: PhantomData,
        })
    } else {
        u16::deserialize(deserializer).map(from_raw)
    }
}

macro_rules! serde_impls {
    ( $($t:ident),* ) => {
        $(
            impl<'de> Deserialize<'de> for $t {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    deserialize_code(deserializer, <$t>::from_raw)
                }
            }

            impl Serialize for $t {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    match self.name() {
                        Some(name) if serializer.is_human_readable() => {
                            serializer.collect_str(&name)
                        }
                        _ => self.raw().serialize(serializer),
                    }
                }
            }
        )*
    };
}

serde_impls!(Abs, Key, Rel, Misc, Led, Switch, Sound);

#[cfg(test)]
mod tests {
    use csv::{ReaderBuilder, WriterBuilder};

    use super::*;

    #[test]
    fn csv() {
        let mut out = Vec::new();
        let mut w = WriterBuilder::new().from_writer(&mut out);
        w.serialize(Abs::MT_TRACKING_ID).unwrap();
        w.serialize(Abs::from_raw(0x3e)).unwrap();
        w.flush().unwrap();
        drop(w);

        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, "ABS_MT_TRACKING_ID\n62\n");

        let mut r = ReaderBuilder::new()
            .has_headers(false)
            .from_reader(s.as_bytes());
        let mut iter = r.deserialize::<Abs>();
        assert_eq!(iter.next().unwrap().unwrap(), Abs::MT_TRACKING_ID);
        assert_eq!(iter.next().unwrap().unwrap(), Abs::from_raw(0x3e));
        assert!(iter.next().is_none());
    }

    #[test]
    fn csv_unknown_name() {
        let mut r = ReaderBuilder::new()
            .has_headers(false)
            .from_reader("KEY_DOES_NOT_EXIST\n".as_bytes());
        assert!(r.deserialize::<Key>().next().unwrap().is_err());
    }

    #[test]
    fn postcard() {
        let b = postcard::to_allocvec(&Key::KEY_F12).unwrap();
        assert_eq!(postcard::from_bytes::<Key>(&b).unwrap(), Key::KEY_F12);

        let b = postcard::to_allocvec(&Led::from_raw(0xffff)).unwrap();
        assert_eq!(postcard::from_bytes::<Led>(&b).unwrap(), Led::from_raw(0xffff));
    }
}
