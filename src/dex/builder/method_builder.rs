use super::{BuilderInstruction, Label, MutableMethodImplementation};
use crate::dex::{DebugItem, Error};
use std::collections::{HashMap, HashSet};

/// Builds a method top to bottom, with labels referred to by name
///
/// Labels can be used before they are placed, so forward jumps are written the same way as
/// backward ones. Placing a label pins it to whatever instruction gets added next.
pub struct MethodImplementationBuilder {
    method: MutableMethodImplementation,
    named_labels: HashMap<String, Label>,
    placed: HashSet<Label>,
}

impl MethodImplementationBuilder {
    pub fn new(register_count: u16) -> MethodImplementationBuilder {
        MethodImplementationBuilder {
            method: MutableMethodImplementation::new(register_count),
            named_labels: HashMap::new(),
            placed: HashSet::new(),
        }
    }

    /// Label with this name (created on first use)
    pub fn label(&mut self, name: &str) -> Label {
        if let Some(label) = self.named_labels.get(name) {
            return *label;
        }
        let label = self.method.unplaced_label();
        self.named_labels.insert(name.to_owned(), label);
        label
    }

    /// Place the label with this name at the current position
    pub fn place_label(&mut self, name: &str) -> Result<Label, Error> {
        let label = self.label(name);
        if self.placed.contains(&label) {
            return Err(Error::DuplicateLabel(name.to_owned()));
        }
        let index = self.method.len();
        self.method.place_label(label, index);
        self.placed.insert(label);
        Ok(label)
    }

    pub fn add_instruction(&mut self, instruction: BuilderInstruction) -> Result<(), Error> {
        self.method.append_instruction(instruction)
    }

    /// Add a handler for the instructions between two labels (the end label is excluded)
    pub fn add_catch(
        &mut self,
        exception_type: Option<u32>,
        start: &str,
        end: &str,
        handler: &str,
    ) -> Result<(), Error> {
        let start = self.label(start);
        let end = self.label(end);
        let handler = self.label(handler);
        self.method
            .add_try_block(start, end, handler, exception_type)
    }

    pub fn add_line_number(&mut self, line: u32) -> Result<(), Error> {
        self.add_debug_item(DebugItem::LineNumber { line })
    }

    /// Add a debug item at the current position
    pub fn add_debug_item(&mut self, item: DebugItem) -> Result<(), Error> {
        let index = self.method.len();
        self.method.add_debug_item(index, item)
    }

    /// Finish the method, checking every named label was placed
    pub fn build(self) -> Result<MutableMethodImplementation, Error> {
        let mut unplaced_labels: Vec<String> = self
            .named_labels
            .iter()
            .filter(|(_, label)| !self.placed.contains(*label))
            .map(|(name, _)| name.clone())
            .collect();
        if !unplaced_labels.is_empty() {
            unplaced_labels.sort();
            return Err(Error::MethodNotFinished { unplaced_labels });
        }
        Ok(self.method)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dex::{Instruction, Opcode};

    #[test]
    fn forward_and_backward_labels() {
        let mut builder = MethodImplementationBuilder::new(1);
        builder.place_label("top").unwrap();
        let end = builder.label("end");
        builder
            .add_instruction(Instruction::Format21t {
                opcode: Opcode::IfEqz,
                register_a: 0,
                target: end,
            })
            .unwrap();
        let top = builder.label("top");
        builder
            .add_instruction(Instruction::Format10t {
                opcode: Opcode::Goto,
                target: top,
            })
            .unwrap();
        builder.place_label("end").unwrap();
        builder.add_line_number(3).unwrap();
        builder
            .add_instruction(Instruction::Format10x {
                opcode: Opcode::ReturnVoid,
            })
            .unwrap();

        let mut method = builder.build().unwrap();
        let exported = method.to_immutable().unwrap();
        let offsets: Vec<Vec<i32>> = exported
            .instructions
            .iter()
            .map(|(_, _, instruction)| instruction.targets().into_iter().copied().collect())
            .collect();
        assert_eq!(offsets, vec![vec![3], vec![-2], vec![]]);
        assert_eq!(exported.debug_items[0].address, 3);
    }

    #[test]
    fn unplaced_labels_are_reported() {
        let mut builder = MethodImplementationBuilder::new(0);
        let missing = builder.label("missing");
        builder
            .add_instruction(Instruction::Format10t {
                opcode: Opcode::Goto,
                target: missing,
            })
            .unwrap();
        match builder.build() {
            Err(Error::MethodNotFinished { unplaced_labels }) => {
                assert_eq!(unplaced_labels, vec!["missing".to_owned()])
            }
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn labels_cannot_be_placed_twice() {
        let mut builder = MethodImplementationBuilder::new(0);
        builder.place_label("here").unwrap();
        assert!(matches!(
            builder.place_label("here"),
            Err(Error::DuplicateLabel(name)) if name == "here"
        ));
    }
}
