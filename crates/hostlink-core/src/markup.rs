//! Tag markup to widget document translation.
//!
//! Lets the agent describe a widget tree as markup instead of a nested
//! widget document:
//!
//! ```text
//! <CanvasPanel Name="Root">
//!     <Button Name="Play" Slot.Position="[100, 100]" IsEnabled="true">
//!         <TextBlock Text="Play"/>
//!     </Button>
//! </CanvasPanel>
//! ```
//!
//! becomes
//!
//! ```json
//! {"widget_name": "Root", "widget_class": "/Script/UMG.CanvasPanel", "properties": {},
//!  "children": [{"widget_name": "Play", "widget_class": "/Script/UMG.Button",
//!                "properties": {"IsEnabled": true, "Slot": {"Position": [100, 100]}},
//!                "children": [...]}]}
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Number, Value};

const CLASS_PREFIX: &str = "/Script/UMG.";
const SLOT_PREFIX: &str = "Slot.";

/// Known widget tags. Anything else maps to `/Script/UMG.<Tag>`.
const WIDGET_TAGS: &[&str] = &[
    "Button",
    "TextBlock",
    "Image",
    "CanvasPanel",
    "VerticalBox",
    "HorizontalBox",
    "Overlay",
    "Border",
    "EditableTextBox",
    "ProgressBar",
    "Spacer",
    "SizeBox",
    "ScrollBox",
    "GridPanel",
    "UniformGridPanel",
    "WrapBox",
    "WidgetSwitcher",
    "SafeZone",
    "ScaleBox",
    "InvalidationBox",
    "RetainerBox",
    "CheckBox",
    "Slider",
    "ComboBoxString",
];

/// Lowercase HTML-style aliases.
const TAG_ALIASES: &[(&str, &str)] = &[
    ("div", "CanvasPanel"),
    ("span", "TextBlock"),
    ("p", "TextBlock"),
    ("img", "Image"),
    ("button", "Button"),
    ("input", "EditableTextBox"),
];

/// Errors from translating markup.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("markup contains no elements")]
    Empty,

    #[error("markup must have a single root element, found another <{0}>")]
    MultipleRoots(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("malformed markup at byte {position}: {message}")]
    Syntax { position: u64, message: String },
}

/// Class path for a markup tag.
pub fn widget_class(tag: &str) -> String {
    if let Some(known) = WIDGET_TAGS.iter().find(|t| **t == tag) {
        return format!("{CLASS_PREFIX}{known}");
    }
    let lower = tag.to_ascii_lowercase();
    if let Some((_, class)) = TAG_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return format!("{CLASS_PREFIX}{class}");
    }
    format!("{CLASS_PREFIX}{tag}")
}

/// Type an attribute value: booleans, numbers, and JSON containers become
/// typed values; everything else stays a string.
pub fn attribute_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if trimmed.contains('.') {
        if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    } else if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if (raw.starts_with('{') || raw.starts_with('['))
        && let Ok(v) = serde_json::from_str::<Value>(raw)
    {
        return v;
    }
    Value::String(raw.to_string())
}

/// Element under construction.
struct Node {
    tag: String,
    widget: Map<String, Value>,
    properties: Map<String, Value>,
    slot: Map<String, Value>,
    children: Vec<Value>,
    text: String,
}

impl Node {
    fn finish(mut self) -> Value {
        if !self.text.is_empty() && !self.properties.contains_key("Text") {
            self.properties.insert("Text".into(), Value::String(self.text));
        }
        if !self.slot.is_empty() {
            self.properties.insert("Slot".into(), Value::Object(self.slot));
        }
        self.widget
            .insert("properties".into(), Value::Object(self.properties));
        if !self.children.is_empty() {
            self.widget
                .insert("children".into(), Value::Array(self.children));
        }
        Value::Object(self.widget)
    }
}

/// Translate markup with a single root element into a widget document.
pub fn translate(markup: &str) -> Result<Value, MarkupError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Value> = None;
    let mut counter = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| MarkupError::Syntax {
            position: reader.error_position(),
            message: e.to_string(),
        })?;
        match event {
            Event::Start(ref e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(MarkupError::MultipleRoots(tag_name(e)));
                }
                stack.push(open(e, &mut counter, &reader)?);
            }
            Event::Empty(ref e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(MarkupError::MultipleRoots(tag_name(e)));
                }
                let node = open(e, &mut counter, &reader)?.finish();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    let node = node.finish();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
            }
            Event::Text(ref t) => {
                if let Some(node) = stack.last_mut() {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if !text.is_empty() {
                        if !node.text.is_empty() {
                            node.text.push(' ');
                        }
                        node.text.push_str(text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(MarkupError::Unclosed(open.tag.clone()));
    }
    root.ok_or(MarkupError::Empty)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn open(
    e: &BytesStart<'_>,
    counter: &mut usize,
    reader: &Reader<&[u8]>,
) -> Result<Node, MarkupError> {
    let tag = tag_name(e);
    let mut name = None;
    let mut properties = Map::new();
    let mut slot = Map::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| MarkupError::Syntax {
            position: reader.buffer_position(),
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
        };

        if key.eq_ignore_ascii_case("name") {
            name = Some(value);
        } else if let Some(slot_key) = key.strip_prefix(SLOT_PREFIX) {
            slot.insert(slot_key.to_string(), attribute_value(&value));
        } else {
            properties.insert(key, attribute_value(&value));
        }
    }

    let name = name.unwrap_or_else(|| {
        let generated = format!("{tag}_{counter}");
        *counter += 1;
        generated
    });

    let mut widget = Map::new();
    widget.insert("widget_name".into(), Value::String(name));
    widget.insert("widget_class".into(), Value::String(widget_class(&tag)));

    Ok(Node {
        tag,
        widget,
        properties,
        slot,
        children: Vec::new(),
        text: String::new(),
    })
}
