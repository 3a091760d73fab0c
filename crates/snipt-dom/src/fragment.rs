//! Detached subtrees used to rebuild markup wholesale and to render HTML.

const VOID_ELEMENTS: [&str; 6] = ["br", "hr", "img", "input", "meta", "wbr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

impl Fragment {
    pub fn element(tag: &str) -> Self {
        Fragment::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }

    pub fn line_break() -> Self {
        Self::element("br")
    }

    /// `<tag>text</tag>`, or `<tag><br></tag>` for an empty line
    pub fn wrap_line(tag: &str, line: &str) -> Self {
        if line.is_empty() {
            Self::element(tag).with_child(Self::line_break())
        } else {
            Self::element(tag).with_child(Self::text(line))
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        if let Fragment::Element { attributes, .. } = &mut self {
            attributes.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn with_child(mut self, child: Fragment) -> Self {
        if let Fragment::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, more: impl IntoIterator<Item = Fragment>) -> Self {
        if let Fragment::Element { children, .. } = &mut self {
            children.extend(more);
        }
        self
    }

    pub fn text_content(&self) -> String {
        match self {
            Fragment::Text(text) => text.clone(),
            Fragment::Element { children, .. } => children.iter().map(Fragment::text_content).collect(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Fragment::Text(text) => out.push_str(&escape_text(text)),
            Fragment::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

pub fn render_html(fragments: &[Fragment]) -> String {
    fragments.iter().map(Fragment::to_html).collect()
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_markup_with_escaping() {
        let fragment = Fragment::element("p")
            .with_attribute("class", "a\"b")
            .with_child(Fragment::text("1 < 2 & 3"))
            .with_child(Fragment::line_break());
        assert_eq!(
            fragment.to_html(),
            "<p class=\"a&quot;b\">1 &lt; 2 &amp; 3<br></p>"
        );
    }

    #[test]
    fn empty_line_gets_a_break() {
        assert_eq!(Fragment::wrap_line("p", "").to_html(), "<p><br></p>");
        assert_eq!(Fragment::wrap_line("div", "x").text_content(), "x");
    }
}
