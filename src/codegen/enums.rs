// Enum deduplication and the `enums.gd` container.

use std::collections::HashMap;

use anyhow::Result;

use super::names::class_name;
use super::writer::{OutputSink, Unit};
use crate::model::{Document, Enum};

/// Class name of the single emitted enum container.
pub const ENUM_CONTAINER: &str = "TwirpEnums";
pub const ENUM_CONTAINER_FILE: &str = "enums.gd";

/// Every enum of a run, deduplicated by full name.
///
/// The first occurrence of a name wins and iteration follows first-encounter
/// order across all files.
#[derive(Debug, Default)]
pub struct EnumIndex<'a> {
    order: Vec<&'a Enum>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> EnumIndex<'a> {
    pub fn build(doc: &'a Document) -> Self {
        let mut index = EnumIndex::default();
        for file in &doc.files {
            for e in &file.enums {
                index.insert(e);
            }
        }
        index
    }

    /// Returns false if an enum of the same name was already present.
    pub fn insert(&mut self, e: &'a Enum) -> bool {
        if self.by_name.contains_key(e.full_name.as_str()) {
            return false;
        }
        self.by_name.insert(&e.full_name, self.order.len());
        self.order.push(e);
        true
    }

    pub fn get(&self, full_name: &str) -> Option<&'a Enum> {
        self.by_name.get(full_name).map(|&i| self.order[i])
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.by_name.contains_key(full_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Enum> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Qualified reference to a generated enum, e.g. `TwirpEnums.shop_Color`.
pub fn enum_reference(full_name: &str) -> String {
    format!("{ENUM_CONTAINER}.{}", class_name(full_name))
}

pub fn emit_enums(index: &EnumIndex, sink: &mut dyn OutputSink) -> Result<()> {
    let mut unit = Unit::new(ENUM_CONTAINER_FILE);

    unit.line("extends Node");
    unit.line(format!("class_name {ENUM_CONTAINER}"));
    unit.blank();

    for e in index.iter() {
        unit.line(format!("enum {} {{", class_name(&e.full_name)));
        {
            let _i = unit.indent();
            let last = e.values.len().saturating_sub(1);
            for (i, v) in e.values.iter().enumerate() {
                let sep = if i == last { "" } else { "," };
                unit.line(format!("{} = {}{sep}", v.name, v.number));
            }
        }
        unit.line("}");
        unit.blank();
    }

    unit.finish(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumValue, File};

    fn color(values: &[(&str, i32)]) -> Enum {
        Enum {
            full_name: "shop.Color".to_string(),
            values: values
                .iter()
                .map(|&(name, number)| EnumValue {
                    name: name.to_string(),
                    number,
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let doc = Document {
            files: vec![
                File {
                    name: "a.proto".into(),
                    enums: vec![color(&[("RED", 0), ("GREEN", 1)])],
                    ..Default::default()
                },
                File {
                    name: "b.proto".into(),
                    enums: vec![
                        Enum {
                            full_name: "shop.Size".into(),
                            values: vec![],
                        },
                        color(&[("GREEN", 1), ("RED", 0)]),
                    ],
                    ..Default::default()
                },
            ],
        };
        let index = EnumIndex::build(&doc);
        assert_eq!(index.len(), 2);
        let names: Vec<_> = index.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, ["shop.Color", "shop.Size"]);
        assert_eq!(index.get("shop.Color").unwrap().values[0].name, "RED");
    }

    #[test]
    fn test_emit_container() {
        let doc = Document {
            files: vec![File {
                enums: vec![color(&[("NEG", -3), ("RED", 0), ("FAR", 100)])],
                ..Default::default()
            }],
        };
        let index = EnumIndex::build(&doc);
        let mut sink: Vec<(String, String)> = Vec::new();
        emit_enums(&index, &mut sink).unwrap();
        assert_eq!(sink[0].0, "enums.gd");
        assert_eq!(
            sink[0].1,
            "extends Node\nclass_name TwirpEnums\n\nenum shop_Color {\n\tNEG = -3,\n\tRED = 0,\n\tFAR = 100\n}\n\n"
        );
    }

    #[test]
    fn test_emit_enum_without_values() {
        let doc = Document {
            files: vec![File {
                enums: vec![color(&[])],
                ..Default::default()
            }],
        };
        let index = EnumIndex::build(&doc);
        let mut sink: Vec<(String, String)> = Vec::new();
        emit_enums(&index, &mut sink).unwrap();
        assert_eq!(sink[0].1, "extends Node\nclass_name TwirpEnums\n\nenum shop_Color {\n}\n\n");
    }

    #[test]
    fn test_enum_reference() {
        assert_eq!(enum_reference("shop.v1.Color"), "TwirpEnums.shop_v1_Color");
    }
}
