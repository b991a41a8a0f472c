//! Byte dispatch tables.
//!
//! Every structural state owns a [`Dispatch`]: one [`Action`] per byte value
//! plus a sentinel message naming what the state expects, which becomes the
//! error message when the action is [`Action::Error`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Action {
    Error,
    Skip,
    Comment,
    OpenArray,
    CloseArray,
    OpenObject,
    CloseObject,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    NaN,
    Infinity,
    /// A value starts after a complete document.
    NextDocument,
}

pub(super) struct Dispatch {
    pub(super) name: &'static str,
    pub(super) actions: [Action; 256],
    pub(super) expected: &'static str,
}

impl Dispatch {
    #[inline(always)]
    pub(super) fn action(&self, byte: u8) -> Action {
        self.actions[byte as usize]
    }
}

const fn base() -> [Action; 256] {
    let mut t = [Action::Error; 256];
    t[b' ' as usize] = Action::Skip;
    t[b'\t' as usize] = Action::Skip;
    t[b'\n' as usize] = Action::Skip;
    t[b'\r' as usize] = Action::Skip;
    t[b'/' as usize] = Action::Comment;
    // Closers are always routed to the close handler so that a misplaced one
    // is reported as a structural error.
    t[b']' as usize] = Action::CloseArray;
    t[b'}' as usize] = Action::CloseObject;
    t
}

const fn value_starts(mut t: [Action; 256], number: Action) -> [Action; 256] {
    let starts = if matches!(number, Action::NextDocument) {
        [Action::NextDocument; 9]
    } else {
        [
            Action::OpenObject,
            Action::OpenArray,
            Action::String,
            Action::True,
            Action::False,
            Action::Null,
            Action::NaN,
            Action::Infinity,
            Action::Number,
        ]
    };
    t[b'{' as usize] = starts[0];
    t[b'[' as usize] = starts[1];
    t[b'"' as usize] = starts[2];
    t[b't' as usize] = starts[3];
    t[b'f' as usize] = starts[4];
    t[b'n' as usize] = starts[5];
    t[b'N' as usize] = starts[6];
    t[b'I' as usize] = starts[7];
    t[b'-' as usize] = starts[8];
    let mut c = b'0';
    while c <= b'9' {
        t[c as usize] = starts[8];
        c += 1;
    }
    t
}

const fn with(mut t: [Action; 256], byte: u8, action: Action) -> [Action; 256] {
    t[byte as usize] = action;
    t
}

pub(super) static VALUE: Dispatch = Dispatch {
    name: "value",
    actions: value_starts(base(), Action::Number),
    expected: "expected a value",
};

pub(super) static ARRAY_FIRST: Dispatch = Dispatch {
    name: "array_first",
    actions: value_starts(base(), Action::Number),
    expected: "expected a value or ']'",
};

pub(super) static OBJECT_FIRST: Dispatch = Dispatch {
    name: "object_first",
    actions: with(base(), b'"', Action::String),
    expected: "expected a key or '}'",
};

pub(super) static OBJECT_KEY: Dispatch = Dispatch {
    name: "object_key",
    actions: with(base(), b'"', Action::String),
    expected: "expected a key",
};

pub(super) static COLON: Dispatch = Dispatch {
    name: "colon",
    actions: with(base(), b':', Action::Colon),
    expected: "expected ':'",
};

pub(super) static AFTER_ARRAY_VALUE: Dispatch = Dispatch {
    name: "after_array_value",
    actions: with(base(), b',', Action::Comma),
    expected: "expected ',' or ']'",
};

pub(super) static AFTER_OBJECT_VALUE: Dispatch = Dispatch {
    name: "after_object_value",
    actions: with(base(), b',', Action::Comma),
    expected: "expected ',' or '}'",
};

pub(super) static DONE: Dispatch = Dispatch {
    name: "done",
    actions: value_starts(base(), Action::NextDocument),
    expected: "expected end of input",
};

/// Bytes that can be copied verbatim inside a string.
pub(super) const PLAIN: u8 = 0;
pub(super) const QUOTE: u8 = 1;
pub(super) const BACKSLASH: u8 = 2;
pub(super) const CONTROL: u8 = 3;

pub(super) static STRING_CLASS: [u8; 256] = {
    let mut t = [PLAIN; 256];
    let mut c = 0;
    while c < 0x20 {
        t[c] = CONTROL;
        c += 1;
    }
    t[b'"' as usize] = QUOTE;
    t[b'\\' as usize] = BACKSLASH;
    t
};

/// Value of an ASCII hex digit, or `0xFF`.
pub(super) static HEX: [u8; 256] = {
    let mut t = [0xFF; 256];
    let mut c = 0;
    while c < 10 {
        t[b'0' as usize + c] = c as u8;
        c += 1;
    }
    let mut c = 0;
    while c < 6 {
        t[b'a' as usize + c] = 10 + c as u8;
        t[b'A' as usize + c] = 10 + c as u8;
        c += 1;
    }
    t
};
