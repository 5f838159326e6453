use dexasm::dex::builder::{BuilderInstruction, MethodImplementationBuilder};
use dexasm::dex::{Instruction, Opcode};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn nop() -> BuilderInstruction {
    Instruction::Format10x {
        opcode: Opcode::Nop,
    }
}

fn return_void() -> BuilderInstruction {
    Instruction::Format10x {
        opcode: Opcode::ReturnVoid,
    }
}

fn add_nops(builder: &mut MethodImplementationBuilder, count: usize) {
    for _ in 0..count {
        builder.add_instruction(nop()).unwrap();
    }
}

/// Opcode and offset of every exported instruction
fn exported_gotos(builder: MethodImplementationBuilder) -> Vec<(Opcode, i32)> {
    let mut method = builder.build().unwrap();
    let exported = method.to_immutable().unwrap();
    exported
        .instructions
        .iter()
        .filter(|(_, _, instruction)| instruction.opcode().is_goto())
        .map(|(_, _, instruction)| (instruction.opcode(), *instruction.targets()[0]))
        .collect()
}

#[test]
fn short_goto_stays_short() {
    init_logging();
    let mut builder = MethodImplementationBuilder::new(10);
    let target = builder.label("target");
    builder
        .add_instruction(Instruction::Format10t {
            opcode: Opcode::Goto,
            target,
        })
        .unwrap();
    add_nops(&mut builder, 126);
    builder.place_label("target").unwrap();
    builder.add_instruction(return_void()).unwrap();

    assert_eq!(exported_gotos(builder), vec![(Opcode::Goto, 127)]);
}

#[test]
fn goto_widened_to_goto16() {
    init_logging();
    let mut builder = MethodImplementationBuilder::new(10);
    let target = builder.label("target");
    builder
        .add_instruction(Instruction::Format10t {
            opcode: Opcode::Goto,
            target,
        })
        .unwrap();
    add_nops(&mut builder, 500);
    builder.place_label("target").unwrap();
    builder.add_instruction(return_void()).unwrap();

    let mut method = builder.build().unwrap();
    let exported = method.to_immutable().unwrap();
    assert_eq!(exported.instructions.len(), 502);
    assert_eq!(
        exported.instructions.get_index(0).map(|(_, instr)| instr.clone()),
        Some(Instruction::Format20t {
            opcode: Opcode::Goto16,
            target: 502,
        })
    );
}

#[test]
fn backward_goto_widened_to_goto16() {
    init_logging();
    let mut builder = MethodImplementationBuilder::new(10);
    builder.place_label("target").unwrap();
    add_nops(&mut builder, 129);
    let target = builder.label("target");
    builder
        .add_instruction(Instruction::Format10t {
            opcode: Opcode::Goto,
            target,
        })
        .unwrap();

    assert_eq!(exported_gotos(builder), vec![(Opcode::Goto16, -129)]);
}

#[test]
fn goto_widened_to_goto32() {
    init_logging();
    let mut builder = MethodImplementationBuilder::new(10);
    let target = builder.label("target");
    builder
        .add_instruction(Instruction::Format10t {
            opcode: Opcode::Goto,
            target,
        })
        .unwrap();
    add_nops(&mut builder, 70000);
    builder.place_label("target").unwrap();
    builder.add_instruction(return_void()).unwrap();

    assert_eq!(exported_gotos(builder), vec![(Opcode::Goto32, 70003)]);
}

#[test]
fn goto16_widened_to_goto32() {
    init_logging();
    let mut builder = MethodImplementationBuilder::new(10);
    let target = builder.label("target");
    builder
        .add_instruction(Instruction::Format20t {
            opcode: Opcode::Goto16,
            target,
        })
        .unwrap();
    add_nops(&mut builder, 70000);
    builder.place_label("target").unwrap();
    builder.add_instruction(return_void()).unwrap();

    assert_eq!(exported_gotos(builder), vec![(Opcode::Goto32, 70003)]);
}

/// Widening the inner `goto` pushes the outer `goto/16` just past its range
#[test]
fn widening_cascades() {
    init_logging();
    let mut builder = MethodImplementationBuilder::new(10);
    let outer_target = builder.label("outer");
    builder
        .add_instruction(Instruction::Format20t {
            opcode: Opcode::Goto16,
            target: outer_target,
        })
        .unwrap();
    add_nops(&mut builder, 1000);
    let inner_target = builder.label("inner");
    builder
        .add_instruction(Instruction::Format10t {
            opcode: Opcode::Goto,
            target: inner_target,
        })
        .unwrap();
    add_nops(&mut builder, 499);
    builder.place_label("inner").unwrap();
    add_nops(&mut builder, 31265);
    builder.place_label("outer").unwrap();
    builder.add_instruction(return_void()).unwrap();

    let mut method = builder.build().unwrap();
    let exported = method.to_immutable().unwrap();
    assert_eq!(exported.instructions.len(), 32767);
    assert_eq!(
        exported.instructions.get_index(0).map(|(_, instr)| instr.clone()),
        Some(Instruction::Format30t {
            opcode: Opcode::Goto32,
            target: 32769,
        })
    );
    assert_eq!(
        exported.instructions.get_index(1001).map(|(_, instr)| instr.opcode()),
        Some(Opcode::Goto16)
    );
}
