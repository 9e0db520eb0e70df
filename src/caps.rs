//! Capability bitmaps and cached device state.

use crate::{
    AbsInfo, InputProp, KeyRepeat,
    bits::{BitSet, Word},
    event::{
        Abs, EventCode, EventType, FfFeature, Key, Led, Misc, Rel, Repeat, Sound, Switch, Syn,
    },
};

/// The event types, codes and properties a device supports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    pub(crate) types: BitSet<EventType>,
    pub(crate) props: BitSet<InputProp>,
    pub(crate) syn: BitSet<Syn>,
    pub(crate) keys: BitSet<Key>,
    pub(crate) rel: BitSet<Rel>,
    pub(crate) abs: BitSet<Abs>,
    pub(crate) misc: BitSet<Misc>,
    pub(crate) switches: BitSet<Switch>,
    pub(crate) leds: BitSet<Led>,
    pub(crate) sounds: BitSet<Sound>,
    pub(crate) rep: BitSet<Repeat>,
    pub(crate) ff: BitSet<FfFeature>,
}

/// Every event type with a code table, in ascending order.
pub(crate) const CODE_TYPES: [EventType; 10] = [
    EventType::SYN,
    EventType::KEY,
    EventType::REL,
    EventType::ABS,
    EventType::MSC,
    EventType::SW,
    EventType::LED,
    EventType::SND,
    EventType::REP,
    EventType::FF,
];

impl Capabilities {
    /// `EV_SYN` is always considered supported.
    pub fn has_type(&self, ty: EventType) -> bool {
        ty == EventType::SYN || self.types.contains(ty)
    }

    pub fn has_code(&self, code: impl Into<EventCode>) -> bool {
        let code = code.into();
        if !code.in_range() || !self.has_type(code.event_type()) {
            return false;
        }
        match code {
            EventCode::Syn(_) => true,
            EventCode::Key(c) => self.keys.contains(c),
            EventCode::Rel(c) => self.rel.contains(c),
            EventCode::Abs(c) => self.abs.contains(c),
            EventCode::Misc(c) => self.misc.contains(c),
            EventCode::Switch(c) => self.switches.contains(c),
            EventCode::Led(c) => self.leds.contains(c),
            EventCode::Sound(c) => self.sounds.contains(c),
            EventCode::Repeat(c) => self.rep.contains(c),
            EventCode::ForceFeedback(c) => self.ff.contains(c),
        }
    }

    pub fn has_property(&self, prop: InputProp) -> bool {
        self.props.contains(prop)
    }

    /// Sets or clears the bit for `code`. Out-of-range codes and `EV_SYN` codes are ignored.
    pub(crate) fn set_code(&mut self, code: EventCode, on: bool) {
        match code {
            EventCode::Syn(_) => {}
            EventCode::Key(c) => self.keys.set(c, on),
            EventCode::Rel(c) => self.rel.set(c, on),
            EventCode::Abs(c) => self.abs.set(c, on),
            EventCode::Misc(c) => self.misc.set(c, on),
            EventCode::Switch(c) => self.switches.set(c, on),
            EventCode::Led(c) => self.leds.set(c, on),
            EventCode::Sound(c) => self.sounds.set(c, on),
            EventCode::Repeat(c) => self.rep.set(c, on),
            EventCode::ForceFeedback(c) => self.ff.set(c, on),
        }
    }

    /// Returns the raw code bitmap of `ty`.
    pub(crate) fn code_words(&self, ty: EventType) -> Option<&[Word]> {
        Some(match ty {
            EventType::SYN => self.syn.words(),
            EventType::KEY => self.keys.words(),
            EventType::REL => self.rel.words(),
            EventType::ABS => self.abs.words(),
            EventType::MSC => self.misc.words(),
            EventType::SW => self.switches.words(),
            EventType::LED => self.leds.words(),
            EventType::SND => self.sounds.words(),
            EventType::REP => self.rep.words(),
            EventType::FF => self.ff.words(),
            _ => return None,
        })
    }

    pub(crate) fn code_words_mut(&mut self, ty: EventType) -> Option<&mut [Word]> {
        Some(match ty {
            EventType::SYN => self.syn.words_mut(),
            EventType::KEY => self.keys.words_mut(),
            EventType::REL => self.rel.words_mut(),
            EventType::ABS => self.abs.words_mut(),
            EventType::MSC => self.misc.words_mut(),
            EventType::SW => self.switches.words_mut(),
            EventType::LED => self.leds.words_mut(),
            EventType::SND => self.sounds.words_mut(),
            EventType::REP => self.rep.words_mut(),
            EventType::FF => self.ff.words_mut(),
            _ => return None,
        })
    }

    /// Counts the supported codes over every supported type except `EV_SYN`.
    pub(crate) fn enabled_code_count(&self) -> usize {
        CODE_TYPES
            .into_iter()
            .filter(|&ty| ty != EventType::SYN && self.has_type(ty))
            .filter_map(|ty| self.code_words(ty))
            .flatten()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// Returns the supported multitouch codes, including [`Abs::MT_SLOT`].
    pub(crate) fn mt_codes(&self) -> impl Iterator<Item = Abs> + '_ {
        self.abs.iter().filter(|abs| abs.is_mt())
    }
}

/// Last known values of every stateful code.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValueCache {
    pub(crate) keys: BitSet<Key>,
    pub(crate) leds: BitSet<Led>,
    pub(crate) switches: BitSet<Switch>,
    pub(crate) sounds: BitSet<Sound>,
    pub(crate) abs: Vec<AbsInfo>,
    pub(crate) rep: KeyRepeat,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self {
            keys: BitSet::new(),
            leds: BitSet::new(),
            switches: BitSet::new(),
            sounds: BitSet::new(),
            abs: vec![AbsInfo::default(); usize::from(Abs::MAX.0) + 1],
            rep: KeyRepeat::default(),
        }
    }
}

impl ValueCache {
    pub(crate) fn abs(&self, abs: Abs) -> Option<&AbsInfo> {
        self.abs.get(usize::from(abs.0))
    }

    pub(crate) fn abs_mut(&mut self, abs: Abs) -> Option<&mut AbsInfo> {
        self.abs.get_mut(usize::from(abs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syn_always_present() {
        let caps = Capabilities::default();
        assert!(caps.has_type(EventType::SYN));
        assert!(caps.has_code(Syn::DROPPED));
        assert!(!caps.has_code(Syn(0x10)));
        assert!(!caps.has_type(EventType::KEY));
    }

    #[test]
    fn code_requires_type() {
        let mut caps = Capabilities::default();
        caps.set_code(Key::BTN_LEFT.into(), true);
        assert!(!caps.has_code(Key::BTN_LEFT));
        caps.types.insert(EventType::KEY);
        assert!(caps.has_code(Key::BTN_LEFT));
        assert!(!caps.has_code(Key::BTN_RIGHT));
    }

    #[test]
    fn counts() {
        let mut caps = Capabilities::default();
        caps.types.extend([EventType::KEY, EventType::ABS]);
        caps.keys.extend([Key::BTN_LEFT, Key::BTN_RIGHT]);
        caps.abs.extend([Abs::X, Abs::MT_SLOT, Abs::MT_TRACKING_ID]);
        caps.leds.insert(Led::NUML);
        assert_eq!(caps.enabled_code_count(), 5);
        assert_eq!(
            caps.mt_codes().collect::<Vec<_>>(),
            [Abs::MT_SLOT, Abs::MT_TRACKING_ID]
        );
    }
}
