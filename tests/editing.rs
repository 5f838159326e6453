use dexasm::dex::builder::{BuilderInstruction, MutableMethodImplementation};
use dexasm::dex::{
    AddressedDebugItem, DebugItem, Error, ExceptionHandler, ImmutableMethodImplementation,
    Instruction, Opcode, TryBlock,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn nop() -> BuilderInstruction {
    Instruction::Format10x {
        opcode: Opcode::Nop,
    }
}

fn const4(register: u8, literal: i8) -> BuilderInstruction {
    Instruction::Format11n {
        opcode: Opcode::Const4,
        register_a: register,
        literal,
    }
}

/// ```text
/// 0: const/4 v0, 0
/// 1: if-eqz v0, +4    (to 5)
/// 3: const/16 v0, 7
/// 5: return v0
/// ```
fn sample_method() -> ImmutableMethodImplementation {
    ImmutableMethodImplementation::new(
        1,
        vec![
            Instruction::Format11n {
                opcode: Opcode::Const4,
                register_a: 0,
                literal: 0,
            },
            Instruction::Format21t {
                opcode: Opcode::IfEqz,
                register_a: 0,
                target: 4,
            },
            Instruction::Format21s {
                opcode: Opcode::Const16,
                register_a: 0,
                literal: 7,
            },
            Instruction::Format11x {
                opcode: Opcode::Return,
                register_a: 0,
            },
        ],
        vec![TryBlock {
            start_address: 1,
            code_unit_count: 4,
            handlers: vec![ExceptionHandler {
                exception_type: Some(2),
                handler_address: 5,
            }],
        }],
        vec![
            AddressedDebugItem {
                address: 0,
                item: DebugItem::PrologueEnd,
            },
            AddressedDebugItem {
                address: 3,
                item: DebugItem::LineNumber { line: 40 },
            },
        ],
    )
}

#[test]
fn import_export_round_trip() {
    init_logging();
    let method = sample_method();
    let mut mutable = MutableMethodImplementation::from_implementation(&method).unwrap();
    assert_eq!(mutable.len(), 4);
    assert_eq!(mutable.register_count(), 1);
    assert_eq!(mutable.to_immutable().unwrap(), method);
}

#[test]
fn relaxation_is_idempotent() {
    init_logging();
    let mut mutable = MutableMethodImplementation::from_implementation(&sample_method()).unwrap();
    let first = mutable.to_immutable().unwrap();
    mutable.relax().unwrap();
    let second = mutable.to_immutable().unwrap();
    assert_eq!(first, second);
}

#[test]
fn addresses_follow_edits() {
    init_logging();
    let mut mutable = MutableMethodImplementation::from_implementation(&sample_method()).unwrap();
    let ret = mutable.label_for_address(5).unwrap();

    mutable.insert_instruction(2, nop()).unwrap();
    mutable.insert_instruction(0, nop()).unwrap();
    mutable.remove_instruction(4).unwrap();

    assert_eq!(mutable.label_index(ret).unwrap(), 4);
    assert_eq!(mutable.label_address(ret).unwrap(), 5);

    let exported = mutable.to_immutable().unwrap();
    let layout: Vec<(usize, Opcode)> = exported
        .instructions
        .iter()
        .map(|(offset, _, instruction)| (offset.0, instruction.opcode()))
        .collect();
    assert_eq!(
        layout,
        vec![
            (0, Opcode::Nop),
            (1, Opcode::Const4),
            (2, Opcode::IfEqz),
            (4, Opcode::Nop),
            (5, Opcode::Return),
        ]
    );
    assert_eq!(
        exported.instructions.get_index(2).map(|(_, i)| *i.targets()[0]),
        Some(3)
    );

    // The removed `const/16` took its line number along to the `return`
    assert_eq!(
        exported.debug_items,
        vec![
            AddressedDebugItem {
                address: 1,
                item: DebugItem::PrologueEnd,
            },
            AddressedDebugItem {
                address: 5,
                item: DebugItem::LineNumber { line: 40 },
            },
        ]
    );
    assert_eq!(
        exported.try_blocks,
        vec![TryBlock {
            start_address: 2,
            code_unit_count: 3,
            handlers: vec![ExceptionHandler {
                exception_type: Some(2),
                handler_address: 5,
            }],
        }]
    );
}

#[test]
fn labels_survive_unrelated_edits() {
    init_logging();
    let mut mutable = MutableMethodImplementation::new(4);
    for register in 0..4 {
        mutable.append_instruction(const4(register, 1)).unwrap();
    }
    let third = mutable.label_for_index(2).unwrap();
    let end = mutable.label_for_index(4).unwrap();

    mutable.swap_instructions(0, 1).unwrap();
    mutable.replace_instruction(3, const4(3, -1)).unwrap();
    mutable.insert_instruction(1, nop()).unwrap();

    assert_eq!(mutable.label_index(third).unwrap(), 3);
    assert_eq!(mutable.label_index(end).unwrap(), 5);
    assert_eq!(mutable.instruction(3), Some(&const4(2, 1)));

    // Appending keeps labels at the end on the new instruction
    mutable.append_instruction(nop()).unwrap();
    assert_eq!(mutable.label_index(end).unwrap(), 5);
    assert_eq!(mutable.len(), 6);
}

#[test]
fn address_inside_instruction_resolves_to_it() {
    init_logging();
    let method = ImmutableMethodImplementation::new(
        1,
        vec![
            Instruction::Format21s {
                opcode: Opcode::Const16,
                register_a: 0,
                literal: 300,
            },
            Instruction::Format10x {
                opcode: Opcode::ReturnVoid,
            },
        ],
        vec![],
        vec![],
    );
    let mut mutable = MutableMethodImplementation::from_implementation(&method).unwrap();

    let start = mutable.label_for_address(0).unwrap();
    let inside = mutable.label_for_address(1).unwrap();
    let ret = mutable.label_for_address(2).unwrap();
    let end = mutable.label_for_address(3).unwrap();
    assert_eq!(mutable.label_index(start).unwrap(), 0);
    assert_eq!(mutable.label_index(inside).unwrap(), 0);
    assert_eq!(mutable.label_index(ret).unwrap(), 1);
    assert_eq!(mutable.label_index(end).unwrap(), 2);
    assert!(matches!(
        mutable.label_for_address(4),
        Err(Error::AddressOutOfBounds {
            address: 4,
            code_units: 3
        })
    ));
}

#[test]
fn line_numbers_can_be_stripped() {
    init_logging();
    let mut mutable = MutableMethodImplementation::from_implementation(&sample_method()).unwrap();
    mutable.retain_debug_items(|item| !matches!(item, DebugItem::LineNumber { .. }));

    let exported = mutable.to_immutable().unwrap();
    assert_eq!(
        exported.debug_items,
        vec![AddressedDebugItem {
            address: 0,
            item: DebugItem::PrologueEnd,
        }]
    );
    assert_eq!(exported.instructions, sample_method().instructions);
}

#[test]
fn branch_into_instruction_resolves_to_it() {
    init_logging();
    let method = ImmutableMethodImplementation::new(
        0,
        vec![
            Instruction::Format10t {
                opcode: Opcode::Goto,
                target: 2,
            },
            Instruction::Format21s {
                opcode: Opcode::Const16,
                register_a: 0,
                literal: 1,
            },
            Instruction::Format10x {
                opcode: Opcode::ReturnVoid,
            },
        ],
        vec![],
        vec![],
    );
    let mut mutable = MutableMethodImplementation::from_implementation(&method).unwrap();
    let exported = mutable.to_immutable().unwrap();
    assert_eq!(
        exported.instructions.get_index(0).map(|(_, i)| i.clone()),
        Some(Instruction::Format10t {
            opcode: Opcode::Goto,
            target: 1,
        })
    );
}

#[test]
fn negative_branch_target_is_rejected() {
    init_logging();
    let method = ImmutableMethodImplementation::new(
        0,
        vec![Instruction::Format10t {
            opcode: Opcode::Goto,
            target: -1,
        }],
        vec![],
        vec![],
    );
    assert!(matches!(
        MutableMethodImplementation::from_implementation(&method),
        Err(Error::AddressOutOfBounds { address: -1, .. })
    ));
}

#[test]
fn invalid_instructions_are_rejected() {
    init_logging();
    let mut mutable = MutableMethodImplementation::new(1);
    assert!(matches!(
        mutable.append_instruction(const4(0, 9)),
        Err(Error::InvalidInstruction {
            opcode: Opcode::Const4,
            ..
        })
    ));
    assert!(matches!(
        mutable.insert_instruction(1, nop()),
        Err(Error::IndexOutOfBounds { index: 1, len: 0 })
    ));
    assert!(mutable.is_empty());
    assert_eq!(mutable.code_units(), 0);
}
