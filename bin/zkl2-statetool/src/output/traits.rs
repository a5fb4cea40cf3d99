/// Objects that can be formatted for porcelain output.
pub(crate) trait Formattable {
    /// Machine-readable `key: value` lines, stable across releases.
    fn format_porcelain(&self) -> String;
}

impl<T: Formattable> Formattable for [T] {
    fn format_porcelain(&self) -> String {
        self.iter()
            .map(Formattable::format_porcelain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<T: Formattable> Formattable for Vec<T> {
    fn format_porcelain(&self) -> String {
        self.as_slice().format_porcelain()
    }
}
