/// Fields of a `library.properties` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryProperties {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub maintainer: Option<String>,
    pub sentence: Option<String>,
    pub paragraph: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub architectures: Option<String>,
}

impl LibraryProperties {
    /// Fill fields from the text of a `library.properties` file.
    ///
    /// Each line is split at its first `=`. Keys are trimmed while values are kept verbatim. Unknown keys
    /// and lines without `=` are ignored, and a key appearing twice keeps its last value.
    pub fn parse(&mut self, text: &str) {
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let slot = match key.trim() {
                "name" => &mut self.name,
                "version" => &mut self.version,
                "author" => &mut self.author,
                "maintainer" => &mut self.maintainer,
                "sentence" => &mut self.sentence,
                "paragraph" => &mut self.paragraph,
                "category" => &mut self.category,
                "url" => &mut self.url,
                "architectures" => &mut self.architectures,
                _ => continue,
            };

            *slot = Some(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_fields() {
        let text = "name=Servo\nversion=1.1.8\nauthor=Michael Margolis, Arduino\nmaintainer=Arduino <info@arduino.cc>\n\
                    sentence=Allows Arduino boards to control a variety of servo motors.\nparagraph=This library can control a great number of servos.\n\
                    category=Device Control\nurl=https://www.arduino.cc/reference/en/libraries/servo/\narchitectures=avr,megaavr,sam\n";

        let mut props = LibraryProperties::default();
        props.parse(text);

        assert_eq!(props.name.as_deref(), Some("Servo"));
        assert_eq!(props.version.as_deref(), Some("1.1.8"));
        assert_eq!(props.author.as_deref(), Some("Michael Margolis, Arduino"));
        assert_eq!(props.maintainer.as_deref(), Some("Arduino <info@arduino.cc>"));
        assert_eq!(props.category.as_deref(), Some("Device Control"));
        assert_eq!(props.url.as_deref(), Some("https://www.arduino.cc/reference/en/libraries/servo/"));
        assert_eq!(props.architectures.as_deref(), Some("avr,megaavr,sam"));
    }

    #[test]
    fn test_parse_splits_on_first_equals_and_keeps_value_verbatim() {
        let mut props = LibraryProperties::default();
        props.parse("  sentence = a=b c \nurl=http://x?y=z");

        assert_eq!(props.sentence.as_deref(), Some(" a=b c "));
        assert_eq!(props.url.as_deref(), Some("http://x?y=z"));
    }

    #[test]
    fn test_parse_ignores_noise() {
        let mut props = LibraryProperties::default();
        props.parse("# comment\nincludes=Servo.h\n\nno equals here\ndot_a_linkage=true\r\n");

        assert_eq!(props, LibraryProperties::default());
    }

    #[test]
    fn test_parse_empty_value() {
        let mut props = LibraryProperties::default();
        props.parse("paragraph=\r\nname=Foo\r\n");

        assert_eq!(props.paragraph.as_deref(), Some(""));
        assert_eq!(props.name.as_deref(), Some("Foo"));
    }
}
