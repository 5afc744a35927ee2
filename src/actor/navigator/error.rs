use thiserror::Error;

/// Terminal outcome of a navigation that did not land on its target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    #[error("no enabled shortcut switches to desktop {}", .0 + 1)]
    NoShortcutConfigured(usize),
    #[error("desktop {} never became active", .0 + 1)]
    SwitchTimedOut(usize),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn messages_count_desktops_from_one() {
        assert_eq!(
            "no enabled shortcut switches to desktop 1",
            SwitchError::NoShortcutConfigured(0).to_string()
        );
        assert_eq!("desktop 4 never became active", SwitchError::SwitchTimedOut(3).to_string());
    }
}
