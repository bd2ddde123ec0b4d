/// A finished transcription plus the counts shown in the result summary.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
}

impl Transcription {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn summary(&self) -> String {
        format!("{} characters · {} words", self.char_count(), self.word_count())
    }
}
