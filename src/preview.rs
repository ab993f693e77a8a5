use eframe::egui::{self, Color32, RichText, Ui};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

const BLOCK_SPACING: f32 = 8.0;
const LIST_INDENT: f32 = 16.0;
const CODE_BG_DARK: Color32 = Color32::from_rgb(40, 44, 52);
const CODE_BG_LIGHT: Color32 = Color32::from_rgb(236, 236, 236);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Span {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: Option<String>,
}

impl Span {
    fn same_style(&self, other: &Span) -> bool {
        self.strong == other.strong
            && self.emphasis == other.emphasis
            && self.strikethrough == other.strikethrough
            && self.code == other.code
            && self.link == other.link
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    CodeBlock { language: Option<String>, code: String },
    Quote(Vec<Block>),
    List { start: Option<u64>, items: Vec<ListItem> },
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

enum Container {
    Root(Vec<Block>),
    Quote(Vec<Block>),
    List { start: Option<u64>, items: Vec<ListItem> },
    Item(ListItem),
}

enum InlineKind {
    Heading(u8),
    Paragraph,
}

/// Folds the pulldown-cmark event stream into nested blocks.
struct BlockBuilder {
    stack: Vec<Container>,
    inline: Option<(InlineKind, Vec<Span>)>,
    code: Option<(Option<String>, String)>,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    links: Vec<String>,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Container::Root(Vec::new())],
            inline: None,
            code: None,
            strong: 0,
            emphasis: 0,
            strikethrough: 0,
            links: Vec::new(),
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(Container::Root(blocks)) | Some(Container::Quote(blocks)) => blocks.push(block),
            Some(Container::Item(item)) => item.blocks.push(block),
            // Lists only hold items; wrap anything else so it isn't lost.
            Some(Container::List { items, .. }) => items.push(ListItem {
                checked: None,
                blocks: vec![block],
            }),
            None => {}
        }
    }

    fn flush_inline(&mut self) {
        if let Some((kind, spans)) = self.inline.take() {
            let block = match kind {
                InlineKind::Heading(level) => Block::Heading { level, spans },
                InlineKind::Paragraph if spans.is_empty() => return,
                InlineKind::Paragraph => Block::Paragraph(spans),
            };
            self.push_block(block);
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        let span = Span {
            text: text.to_owned(),
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
            code,
            link: self.links.last().cloned(),
        };

        // Tight list items carry text without a paragraph around it.
        let (_, spans) = self
            .inline
            .get_or_insert_with(|| (InlineKind::Paragraph, Vec::new()));

        match spans.last_mut() {
            Some(last) if last.same_style(&span) => last.text.push_str(&span.text),
            _ => spans.push(span),
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                self.flush_inline();
                self.inline = Some((InlineKind::Paragraph, Vec::new()));
            }
            Tag::Heading { level, .. } => {
                self.flush_inline();
                self.inline = Some((InlineKind::Heading(heading_level(level)), Vec::new()));
            }
            Tag::BlockQuote(_) => {
                self.flush_inline();
                self.stack.push(Container::Quote(Vec::new()));
            }
            Tag::CodeBlock(kind) => {
                self.flush_inline();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(start) => {
                self.flush_inline();
                self.stack.push(Container::List {
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Item => {
                self.flush_inline();
                self.stack.push(Container::Item(ListItem::default()));
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.into_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::HtmlBlock => self.flush_inline(),
            TagEnd::BlockQuote(_) => {
                self.flush_inline();
                if let Some(Container::Quote(blocks)) = self.stack.pop() {
                    self.push_block(Block::Quote(blocks));
                }
            }
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code.take() {
                    self.push_block(Block::CodeBlock { language, code });
                }
            }
            TagEnd::List(_) => {
                self.flush_inline();
                if let Some(Container::List { start, items }) = self.stack.pop() {
                    self.push_block(Block::List { start, items });
                }
            }
            TagEnd::Item => {
                self.flush_inline();
                if let Some(Container::Item(item)) = self.stack.pop() {
                    if let Some(Container::List { items, .. }) = self.stack.last_mut() {
                        items.push(item);
                    }
                }
            }
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            TagEnd::Link => {
                self.links.pop();
            }
            _ => {}
        }
    }

    fn event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code.as_mut() {
                Some((_, code)) => code.push_str(&text),
                None => self.push_text(&text, false),
            },
            Event::Code(code) => self.push_text(&code, true),
            Event::Html(html) | Event::InlineHtml(html) => match self.code.as_mut() {
                Some((_, code)) => code.push_str(&html),
                None => self.push_text(&html, false),
            },
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            Event::Rule => {
                self.flush_inline();
                self.push_block(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                if let Some(Container::Item(item)) = self.stack.last_mut() {
                    item.checked = Some(checked);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_inline();
        if let Some((language, code)) = self.code.take() {
            self.push_block(Block::CodeBlock { language, code });
        }

        // Balanced input leaves only the root; fold anything left over into it.
        while self.stack.len() > 1 {
            match self.stack.pop() {
                Some(Container::Quote(blocks)) => self.push_block(Block::Quote(blocks)),
                Some(Container::List { start, items }) => self.push_block(Block::List { start, items }),
                Some(Container::Item(item)) => {
                    if let Some(Container::List { items, .. }) = self.stack.last_mut() {
                        items.push(item);
                    }
                }
                _ => {}
            }
        }

        match self.stack.pop() {
            Some(Container::Root(blocks)) => blocks,
            _ => Vec::new(),
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

pub fn parse_markdown(source: &str) -> Vec<Block> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = BlockBuilder::new();
    for event in Parser::new_ext(source, options) {
        builder.event(event);
    }
    builder.finish()
}

/// Rendered view of the editor contents, re-parsed on every change.
#[derive(Default)]
pub struct MarkdownPreview {
    blocks: Vec<Block>,
}

impl MarkdownPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_markdown(&mut self, source: &str) {
        self.blocks = parse_markdown(source);
    }

    #[cfg(test)]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn show(&self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .id_salt("preview")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                show_blocks(ui, &self.blocks);
            });
    }
}

fn show_blocks(ui: &mut Ui, blocks: &[Block]) {
    for block in blocks {
        show_block(ui, block);
    }
}

fn show_block(ui: &mut Ui, block: &Block) {
    match block {
        Block::Heading { level, spans } => {
            let size = match level {
                1 => 28.0,
                2 => 24.0,
                3 => 20.0,
                4 => 18.0,
                5 => 16.0,
                _ => 14.0,
            };
            ui.horizontal_wrapped(|ui| {
                for span in spans {
                    show_span(ui, span, |text| text.size(size).strong());
                }
            });
            ui.add_space(BLOCK_SPACING);
        }
        Block::Paragraph(spans) => {
            show_spans(ui, spans);
            ui.add_space(BLOCK_SPACING);
        }
        Block::CodeBlock { language, code } => {
            let bg = if ui.visuals().dark_mode {
                CODE_BG_DARK
            } else {
                CODE_BG_LIGHT
            };
            egui::Frame::new()
                .fill(bg)
                .corner_radius(4.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    if let Some(language) = language {
                        ui.label(RichText::new(language).small().weak());
                    }
                    ui.label(RichText::new(code.trim_end_matches('\n')).monospace());
                });
            ui.add_space(BLOCK_SPACING);
        }
        Block::Quote(blocks) => {
            ui.horizontal(|ui| {
                ui.separator();
                ui.vertical(|ui| show_blocks(ui, blocks));
            });
        }
        Block::List { start, items } => {
            for (idx, item) in items.iter().enumerate() {
                let marker = match (item.checked, start) {
                    (Some(true), _) => "☑".to_owned(),
                    (Some(false), _) => "☐".to_owned(),
                    (None, Some(first)) => format!("{}.", first + idx as u64),
                    (None, None) => "•".to_owned(),
                };
                ui.horizontal(|ui| {
                    ui.add_space(LIST_INDENT);
                    ui.label(marker);
                    ui.vertical(|ui| show_blocks(ui, &item.blocks));
                });
            }
            ui.add_space(BLOCK_SPACING);
        }
        Block::Rule => {
            ui.separator();
        }
    }
}

fn show_spans(ui: &mut Ui, spans: &[Span]) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for span in spans {
            show_span(ui, span, |text| text);
        }
    });
}

fn show_span(ui: &mut Ui, span: &Span, style: impl Fn(RichText) -> RichText) {
    let mut text = style(RichText::new(&span.text));
    if span.strong {
        text = text.strong();
    }
    if span.emphasis {
        text = text.italics();
    }
    if span.strikethrough {
        text = text.strikethrough();
    }
    if span.code {
        text = text.code();
    }

    match &span.link {
        Some(url) => {
            ui.hyperlink_to(text, url);
        }
        None => {
            ui.label(text);
        }
    }
}
