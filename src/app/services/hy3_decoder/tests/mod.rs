//! Shared fixtures for HY3 decoder tests

use super::*;


/// Builds a fixed-width line by placing text at 1-based columns
pub struct LineBuilder {
    chars: Vec<char>,
}

impl LineBuilder {
    pub fn new(code: &str) -> Self {
        Self {
            chars: code.chars().collect(),
        }
    }

    pub fn at(mut self, start: usize, text: &str) -> Self {
        let begin = start - 1;
        for (offset, c) in text.chars().enumerate() {
            let index = begin + offset;
            if self.chars.len() <= index {
                self.chars.resize(index + 1, ' ');
            }
            self.chars[index] = c;
        }
        self
    }

    pub fn build(self) -> String {
        self.chars.into_iter().collect()
    }
}

pub fn meet_core_line(name: &str, start: &str, end: &str) -> String {
    LineBuilder::new("B1")
        .at(3, name)
        .at(48, "West Wave Aquatic Centre")
        .at(93, start)
        .at(101, end)
        .build()
}

pub fn meet_extended_line(meet_type_code: &str, course_code: &str) -> String {
    LineBuilder::new("B2")
        .at(95, meet_type_code)
        .at(99, course_code)
        .build()
}

/// Team-core line in the fallback (club) layout
pub fn team_line(code: &str, name: &str, region_code: &str) -> String {
    LineBuilder::new("C1")
        .at(3, code)
        .at(8, name)
        .at(54, region_code)
        .build()
}

pub fn team_address_line(address_1: &str, city: &str, postal_code: &str) -> String {
    LineBuilder::new("C2")
        .at(3, address_1)
        .at(63, city)
        .at(95, postal_code)
        .build()
}

pub fn swimmer_line(gender: &str, id: &str, last: &str, first: &str, birth: &str) -> String {
    LineBuilder::new("D1")
        .at(3, gender)
        .at(4, id)
        .at(9, last)
        .at(29, first)
        .at(89, birth)
        .build()
}

/// One meet, one club team and two swimmers
pub fn minimal_results() -> Vec<String> {
    vec![
        meet_core_line("Winter Champs", "08092025", "08102025"),
        meet_extended_line("05", "L"),
        team_line("NSC", "North Shore Swim Club", "AKL"),
        swimmer_line("F", "12345", "Smith", "Jane", "03152010"),
        swimmer_line("M", "23456", "Brown", "Tom", "11022009"),
    ]
}

pub fn builtin_schema() -> SchemaModel {
    SchemaModel::builtin().unwrap()
}
