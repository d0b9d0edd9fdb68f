/// Split `text` into the word strip shown under the avatar.
///
/// Leading and trailing whitespace is ignored and runs of whitespace count as
/// one separator.
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}
