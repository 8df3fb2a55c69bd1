//! ANSI escape recognition.
//!
//! Agent output may carry colour codes or hyperlinks. The console never renders them
//! (styling is expressed as tags on the frame), so they are recognised only to be removed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

/// A recognised escape sequence starting at some byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeSequence {
    pub kind: EscapeKind,
    /// Length in bytes, including the introducer.
    pub length: usize,
}

/// Recognises a complete escape sequence at `pos`.
///
/// Unterminated sequences are not recognised; their bytes are treated as text
/// (the ESC byte itself is a control character and measures zero columns).
pub fn escape_at(input: &str, pos: usize) -> Option<EscapeSequence> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }

    let (kind, end) = match *bytes.get(pos + 1)? {
        b'[' => (EscapeKind::Csi, csi_end(bytes, pos + 2)?),
        b']' => (EscapeKind::Osc, string_terminator_end(bytes, pos + 2)?),
        b'_' => (EscapeKind::Apc, string_terminator_end(bytes, pos + 2)?),
        b'P' => (EscapeKind::Dcs, string_terminator_end(bytes, pos + 2)?),
        b'O' if pos + 2 < bytes.len() => (EscapeKind::Ss3, pos + 3),
        _ => return None,
    };

    // A final byte in the middle of a multi-byte char would make `end` unusable as a slice index.
    input.is_char_boundary(end).then_some(EscapeSequence {
        kind,
        length: end - pos,
    })
}

fn csi_end(bytes: &[u8], from: usize) -> Option<usize> {
    (from..bytes.len())
        .find(|&idx| (0x40..=0x7e).contains(&bytes[idx]))
        .map(|idx| idx + 1)
}

fn string_terminator_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            return Some(idx + 1);
        }
        if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
            return Some(idx + 2);
        }
        idx += 1;
    }
    None
}

/// Returns `input` with every recognised escape sequence removed.
pub fn strip_ansi(input: &str) -> String {
    if !input.contains('\x1b') {
        return input.to_string();
    }

    let mut clean = String::with_capacity(input.len());
    let mut rest_start = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(seq) = escape_at(input, idx) {
            clean.push_str(&input[rest_start..idx]);
            idx += seq.length;
            rest_start = idx;
            continue;
        }
        idx += input[idx..].chars().next().map_or(1, char::len_utf8);
    }
    clean.push_str(&input[rest_start..]);
    clean
}
