//! Element classifier
//!
//! Maps one element to a [`ElementKind`] and the description spoken for it.
//! Classification is evaluated live, so a re-read after the user typed into
//! an input or a media element started playing reflects the new state.

use fos_dom::{Document, InputType, NodeId};

use crate::aria::AriaRole;
use crate::config::OverlayConfig;
use crate::i18n::{Language, ValueHint};

/// Class of the transient number badge
pub const BADGE_CLASS: &str = "a11y-number-badge";

/// What a readable element is, for dispatch and description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Heading,
    Button,
    Link,
    Input,
    Select,
    Textarea,
    Table,
    Fieldset,
    Media,
    Slider,
    Image,
    Generic,
}

impl ElementKind {
    /// Image and media entries are kept even without text
    pub fn allows_empty(self) -> bool {
        matches!(self, Self::Image | Self::Media)
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub kind: ElementKind,
    pub text: String,
}

/// Element classifier bound to one document
pub struct Classifier<'a> {
    doc: &'a Document,
    config: &'a OverlayConfig,
    lang: Language,
}

impl<'a> Classifier<'a> {
    pub fn new(doc: &'a Document, config: &'a OverlayConfig) -> Self {
        Self {
            doc,
            config,
            lang: Language::from_tag(&config.default_lang),
        }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    /// Kind and description, `None` if nothing can be said
    pub fn classify(&self, node: NodeId) -> Option<Classified> {
        let kind = self.kind_of(node)?;
        let text = self.describe(node, kind);
        if text.trim().is_empty() && !kind.allows_empty() {
            return None;
        }
        Some(Classified { kind, text })
    }

    /// Kind by tag, class and role, in a fixed precedence
    pub fn kind_of(&self, node: NodeId) -> Option<ElementKind> {
        let tree = &self.doc.tree;
        let tag = tree.tag_name(node)?;
        let role = AriaRole::of(tree, node);
        let kind = match tag {
            "table" => ElementKind::Table,
            "fieldset" => ElementKind::Fieldset,
            "input" if self.input_type(node).is_text_like() => ElementKind::Input,
            "textarea" => ElementKind::Textarea,
            "select" => ElementKind::Select,
            "button" => ElementKind::Button,
            "a" if tree.attr(node, "href").is_some_and(|h| !h.is_empty()) => ElementKind::Link,
            "img" if tree.attr(node, "alt").is_some_and(|a| !a.trim().is_empty()) => ElementKind::Image,
            _ if tree.has_class(node, "question") || tree.has_class(node, "quiz") => ElementKind::Generic,
            "audio" | "video" => ElementKind::Media,
            _ if self.is_slider(node) => ElementKind::Slider,
            _ if role == Some(AriaRole::Button) => ElementKind::Button,
            _ if role == Some(AriaRole::Link) => ElementKind::Link,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                if !tree.has_attr(node, "aria-label") && !tree.has_attr(node, "aria-describedby") =>
            {
                ElementKind::Heading
            }
            _ => ElementKind::Generic,
        };
        Some(kind)
    }

    /// Carousel root (Swiper, Bootstrap or ARIA carousel region)
    pub fn is_slider(&self, node: NodeId) -> bool {
        let tree = &self.doc.tree;
        tree.has_class(node, "swiper")
            || tree.has_class(node, "carousel")
            || (AriaRole::of(tree, node) == Some(AriaRole::Region)
                && tree.attr(node, "aria-roledescription").is_some_and(|d| d.eq_ignore_ascii_case("carousel")))
    }

    fn input_type(&self, node: NodeId) -> InputType {
        InputType::parse(self.doc.tree.attr(node, "type").unwrap_or("text"))
    }

    fn describe(&self, node: NodeId, kind: ElementKind) -> String {
        let tree = &self.doc.tree;
        let lang = self.lang;
        match kind {
            ElementKind::Table => self.describe_table(node),
            ElementKind::Fieldset => {
                let legend = tree
                    .find_first(node, |t, n| t.has_tag(n, "legend"))
                    .map(|l| self.visible_text(l))
                    .filter(|l| !l.is_empty());
                lang.fieldset(legend.as_deref())
            }
            ElementKind::Input => {
                let value = tree.value(node);
                let placeholder = tree.attr(node, "placeholder").unwrap_or("");
                lang.text_input(
                    self.input_type(node).as_str(),
                    &self.label_text(node),
                    ValueHint::new(&value, placeholder),
                    tree.has_attr(node, "required"),
                )
            }
            ElementKind::Textarea => {
                let value = tree.value(node);
                let placeholder = tree.attr(node, "placeholder").unwrap_or("");
                lang.textarea(
                    &self.label_text(node),
                    ValueHint::new(&value, placeholder),
                    tree.has_attr(node, "required"),
                )
            }
            ElementKind::Select => {
                let count = tree.options(node).len();
                let selected = tree.selected_index(node).and_then(|i| self.option_text(node, i));
                lang.select(&self.label_text(node), selected.as_deref(), count, tree.has_attr(node, "required"))
            }
            ElementKind::Button => lang.button(&self.visible_text(node)),
            ElementKind::Link => lang.link(&self.visible_text(node), self.is_external_link(node)),
            ElementKind::Image => lang.image(tree.attr(node, "alt").unwrap_or("").trim()),
            ElementKind::Media => lang.media(
                tree.has_tag(node, "audio"),
                self.media_title(node).as_deref(),
                tree.duration(node),
                tree.is_paused(node),
            ),
            ElementKind::Slider => {
                let label = tree.attr(node, "aria-label").map(str::trim).filter(|l| !l.is_empty());
                lang.carousel(label, self.slides(node).len())
            }
            ElementKind::Heading => {
                let level = tree.tag_name(node).and_then(|t| t[1..].parse().ok()).unwrap_or(1);
                lang.heading(level, &self.visible_text(node))
            }
            ElementKind::Generic => self.describe_generic(node),
        }
    }

    fn describe_generic(&self, node: NodeId) -> String {
        let tree = &self.doc.tree;
        if tree.has_class(node, "question") || tree.has_class(node, "quiz") {
            return self.describe_question(node);
        }
        if let Some(label) = tree.attr(node, "aria-label") {
            return label.trim().to_string();
        }
        if let Some(desc) = tree.attr(node, "aria-describedby") {
            return self
                .doc
                .get_element_by_id(desc.trim())
                .map(|d| self.visible_text(d))
                .unwrap_or_default();
        }
        self.visible_text(node)
    }

    fn describe_table(&self, table: NodeId) -> String {
        let tree = &self.doc.tree;
        let mut header = None;
        let mut rows = Vec::new();
        let mut first = true;
        for row in tree.find_all(table, |t, n| t.has_tag(n, "tr")) {
            let cells: Vec<String> = tree
                .find_all(row, |t, n| t.has_tag(n, "th") || t.has_tag(n, "td"))
                .into_iter()
                .map(|c| self.visible_text(c))
                .collect();
            let text = cells.join(", ");
            let is_first = std::mem::replace(&mut first, false);
            if text.trim().is_empty() {
                continue;
            }
            if is_first {
                header = Some(text);
            } else {
                rows.push(text);
            }
        }
        self.lang.table(header.as_deref(), &rows)
    }

    fn describe_question(&self, question: NodeId) -> String {
        let tree = &self.doc.tree;
        let options: Vec<String> = tree
            .find_all(question, |t, n| {
                (t.has_tag(n, "input") && matches!(t.attr(n, "type"), Some("radio") | Some("checkbox")))
                    || t.has_class(n, "option")
                    || t.has_attr(n, "data-option")
            })
            .into_iter()
            .enumerate()
            .map(|(i, opt)| {
                let text = match tree.closest(opt, |t, n| t.has_tag(n, "label")) {
                    Some(label) => self.visible_text(label),
                    None => self.visible_text(opt),
                };
                if text.is_empty() { self.lang.unnamed_option(i) } else { text }
            })
            .collect();
        self.lang.question(&self.visible_text(question), &options)
    }

    // ------------------------------------------------------------------
    // Helpers shared with the controller
    // ------------------------------------------------------------------

    /// Text content without number badges, whitespace collapsed
    pub fn visible_text(&self, node: NodeId) -> String {
        let raw = self
            .doc
            .tree
            .text_content_where(node, |t, n| !t.has_class(n, BADGE_CLASS));
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// `label[for=id]` first, else the nearest ancestor `label`
    pub fn associated_label(&self, control: NodeId) -> Option<NodeId> {
        let tree = &self.doc.tree;
        if let Some(id) = tree.attr(control, "id").filter(|id| !id.is_empty()) {
            let explicit = tree.find_first(tree.root(), |t, n| t.has_tag(n, "label") && t.attr(n, "for") == Some(id));
            if explicit.is_some() {
                return explicit;
            }
        }
        tree.ancestors(control).find(|&n| tree.has_tag(n, "label"))
    }

    /// Text of the associated label, empty if none
    pub fn label_text(&self, control: NodeId) -> String {
        self.associated_label(control)
            .map(|l| self.visible_text(l))
            .unwrap_or_default()
    }

    /// Label for short announcements: label, `aria-label`, placeholder, text
    pub fn short_label(&self, node: NodeId) -> String {
        let tree = &self.doc.tree;
        let label = self.label_text(node);
        if !label.is_empty() {
            return label;
        }
        [tree.attr(node, "aria-label"), tree.attr(node, "placeholder")]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.visible_text(node))
    }

    /// Text of the option at `index`
    pub fn option_text(&self, select: NodeId, index: usize) -> Option<String> {
        let option = *self.doc.tree.options(select).get(index)?;
        Some(self.visible_text(option))
    }

    /// `title` or `aria-label` of a media element
    pub fn media_title(&self, media: NodeId) -> Option<String> {
        let tree = &self.doc.tree;
        [tree.attr(media, "title"), tree.attr(media, "aria-label")]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// `href` resolves to a different origin than the document
    pub fn is_external_link(&self, node: NodeId) -> bool {
        let Some(href) = self.doc.tree.attr(node, "href") else {
            return false;
        };
        let (Some(target), Some(origin)) = (self.doc.resolve_href(href), self.doc.origin()) else {
            return false;
        };
        target.origin() != origin
    }

    /// Slides of a carousel in document order
    pub fn slides(&self, slider: NodeId) -> Vec<NodeId> {
        self.doc
            .tree
            .find_all(slider, |t, n| t.has_class(n, "swiper-slide") || t.has_class(n, "carousel-item"))
    }

    /// Language of an element: override attribute, `lang`, nearest ancestor, default
    pub fn resolve_lang(&self, node: NodeId) -> String {
        let tree = &self.doc.tree;
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .find_map(|n| {
                [tree.attr(n, &self.config.lang_attr), tree.attr(n, "lang")]
                    .into_iter()
                    .flatten()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_lang.clone())
    }
}
