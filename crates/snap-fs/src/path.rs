use std::path::{Display, Path};

/// Display helpers for paths shown in logs and error messages.
pub trait Simplified {
    /// Render a path for the user, without any `\\?\` verbatim prefix.
    fn user_display(&self) -> Display<'_>;
}

impl<T: AsRef<Path>> Simplified for T {
    fn user_display(&self) -> Display<'_> {
        dunce::simplified(self.as_ref()).display()
    }
}
