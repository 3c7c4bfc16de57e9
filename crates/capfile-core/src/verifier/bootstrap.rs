//! Bootstrap class that calls one `verifyCap` overload.
//!
//! `Verifier.main` decides for itself how to open the CAP file and exits with
//! the same status whether the package was rejected or the SDK is broken. The
//! bootstrap instead calls the overload chosen by [`VerifierEntry`] and maps
//! the outcome to its exit status:
//!
//! | Status | Meaning |
//! |---|---|
//! | 0 | package verified |
//! | [`EXIT_REJECTED`] | `verifyCap` threw; the exception is printed to stderr |
//! | [`EXIT_LINKAGE`] | verifier class or overload missing from the classpath |
//!
//! Arguments are `<mode> <package> <cap> <export files...>`, with `mode` from
//! [`VerifierEntry::mode`]. The class is written as version 49 so that no
//! stack map frames are needed.

use super::strategy::VerifierEntry;
use crate::sdk::VERIFIER_CLASS;
use crate::sdk::classfile::{
    CONSTANT_CLASS, CONSTANT_FIELDREF, CONSTANT_METHODREF, CONSTANT_NAME_AND_TYPE,
    CONSTANT_STRING, CONSTANT_UTF8,
};

/// Binary name of the bootstrap class, in the default package.
pub(crate) const BOOTSTRAP_CLASS: &str = "CapfileVerify";

/// Exit status when the verifier rejected the package.
pub(crate) const EXIT_REJECTED: i32 = 2;

/// Exit status when the verifier could not be linked.
pub(crate) const EXIT_LINKAGE: i32 = 3;

const CLASS_VERSION: u16 = 49;
const ACC_PUBLIC: u16 = 0x0001;
const ACC_STATIC: u16 = 0x0008;
const ACC_SUPER: u16 = 0x0020;

// Opcodes
const ICONST_0: u8 = 0x03;
const ICONST_1: u8 = 0x04;
const ICONST_2: u8 = 0x05;
const ICONST_3: u8 = 0x06;
const LDC_W: u8 = 0x13;
const ILOAD_2: u8 = 0x1c;
const ALOAD_0: u8 = 0x2a;
const ALOAD_1: u8 = 0x2b;
const AALOAD: u8 = 0x32;
const ISTORE_2: u8 = 0x3d;
const ASTORE_1: u8 = 0x4c;
const POP: u8 = 0x57;
const DUP: u8 = 0x59;
const SWAP: u8 = 0x5f;
const IINC: u8 = 0x84;
const IFEQ: u8 = 0x99;
const IF_ICMPGE: u8 = 0xa2;
const GOTO: u8 = 0xa7;
const RETURN: u8 = 0xb1;
const GETSTATIC: u8 = 0xb2;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const NEW: u8 = 0xbb;
const ARRAYLENGTH: u8 = 0xbe;

// main(String[]): locals are args, the export Vector and a loop index
const MAX_STACK: u16 = 5;
const MAX_LOCALS: u16 = 3;

/// First argument index holding an export file.
const FIRST_EXPORT_ARG: u8 = ICONST_3;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Constant {
    Utf8(String),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    NameAndType(u16, u16),
}

/// Constant pool with deduplicated entries, indexed from 1.
#[derive(Debug, Default)]
struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn add(&mut self, constant: Constant) -> u16 {
        let index = match self.entries.iter().position(|c| *c == constant) {
            Some(i) => i,
            None => {
                self.entries.push(constant);
                self.entries.len() - 1
            }
        };
        (index + 1) as u16
    }

    fn utf8(&mut self, text: &str) -> u16 {
        self.add(Constant::Utf8(text.to_string()))
    }

    fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.add(Constant::Class(name))
    }

    fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        self.add(Constant::String(text))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.add(Constant::NameAndType(name, descriptor))
    }

    fn field(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let nat = self.name_and_type(name, descriptor);
        self.add(Constant::FieldRef(class, nat))
    }

    fn method(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let nat = self.name_and_type(name, descriptor);
        self.add(Constant::MethodRef(class, nat))
    }

    fn write(&self, out: &mut Vec<u8>) {
        push_u16(out, (self.entries.len() + 1) as u16);
        for constant in &self.entries {
            match constant {
                Constant::Utf8(text) => {
                    // identifiers here are ASCII, where modified UTF-8 is plain UTF-8
                    out.push(CONSTANT_UTF8);
                    push_u16(out, text.len() as u16);
                    out.extend_from_slice(text.as_bytes());
                }
                Constant::Class(name) => {
                    out.push(CONSTANT_CLASS);
                    push_u16(out, *name);
                }
                Constant::String(text) => {
                    out.push(CONSTANT_STRING);
                    push_u16(out, *text);
                }
                Constant::FieldRef(class, nat) => {
                    out.push(CONSTANT_FIELDREF);
                    push_u16(out, *class);
                    push_u16(out, *nat);
                }
                Constant::MethodRef(class, nat) => {
                    out.push(CONSTANT_METHODREF);
                    push_u16(out, *class);
                    push_u16(out, *nat);
                }
                Constant::NameAndType(name, descriptor) => {
                    out.push(CONSTANT_NAME_AND_TYPE);
                    push_u16(out, *name);
                    push_u16(out, *descriptor);
                }
            }
        }
    }
}

/// Bytecode under construction, with forward branches patched by `land`.
#[derive(Debug, Default)]
struct Code {
    bytes: Vec<u8>,
}

impl Code {
    fn pos(&self) -> u16 {
        self.bytes.len() as u16
    }

    fn ops(&mut self, ops: &[u8]) {
        self.bytes.extend_from_slice(ops);
    }

    fn op_index(&mut self, op: u8, index: u16) {
        self.bytes.push(op);
        push_u16(&mut self.bytes, index);
    }

    /// Emit a branch to a later position and return where it starts.
    fn branch(&mut self, op: u8) -> u16 {
        let at = self.pos();
        self.ops(&[op, 0, 0]);
        at
    }

    /// Point the branch emitted at `at` to the current position.
    fn land(&mut self, at: u16) {
        let offset = (self.pos() - at).to_be_bytes();
        let at = usize::from(at);
        self.bytes[at + 1..at + 3].copy_from_slice(&offset);
    }

    fn branch_back(&mut self, op: u8, target: u16) {
        let offset = i32::from(target) - i32::from(self.pos());
        self.bytes.push(op);
        self.bytes.extend_from_slice(&(offset as i16).to_be_bytes());
    }
}

/// One exception table row.
#[derive(Debug)]
struct Handler {
    start: u16,
    end: u16,
    handler: u16,
    catch_type: u16,
}

/// Class file bytes of the bootstrap.
pub(crate) fn class_bytes() -> Vec<u8> {
    let mut pool = ConstantPool::default();
    let this_class = pool.class(BOOTSTRAP_CLASS);
    let super_class = pool.class("java/lang/Object");
    let main_name = pool.utf8("main");
    let main_descriptor = pool.utf8("([Ljava/lang/String;)V");
    let code_name = pool.utf8("Code");
    let (code, handlers) = main_body(&mut pool);

    let mut out = Vec::with_capacity(1024);
    out.extend_from_slice(&0xCAFE_BABE_u32.to_be_bytes());
    push_u16(&mut out, 0);
    push_u16(&mut out, CLASS_VERSION);
    pool.write(&mut out);
    push_u16(&mut out, ACC_PUBLIC | ACC_SUPER);
    push_u16(&mut out, this_class);
    push_u16(&mut out, super_class);
    push_u16(&mut out, 0); // interfaces
    push_u16(&mut out, 0); // fields

    push_u16(&mut out, 1);
    push_u16(&mut out, ACC_PUBLIC | ACC_STATIC);
    push_u16(&mut out, main_name);
    push_u16(&mut out, main_descriptor);
    push_u16(&mut out, 1);

    let attribute_len = 2 + 2 + 4 + code.bytes.len() + 2 + handlers.len() * 8 + 2;
    push_u16(&mut out, code_name);
    out.extend_from_slice(&(attribute_len as u32).to_be_bytes());
    push_u16(&mut out, MAX_STACK);
    push_u16(&mut out, MAX_LOCALS);
    out.extend_from_slice(&(code.bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&code.bytes);
    push_u16(&mut out, handlers.len() as u16);
    for h in &handlers {
        push_u16(&mut out, h.start);
        push_u16(&mut out, h.end);
        push_u16(&mut out, h.handler);
        push_u16(&mut out, h.catch_type);
    }
    push_u16(&mut out, 0); // code attributes

    push_u16(&mut out, 0); // class attributes
    out
}

fn main_body(pool: &mut ConstantPool) -> (Code, Vec<Handler>) {
    let verifier = VERIFIER_CLASS.replace('.', "/");
    let vector_init = pool.method("java/util/Vector", "<init>", "()V");
    let vector_add = pool.method("java/util/Vector", "add", "(Ljava/lang/Object;)Z");
    let string_equals = pool.method("java/lang/String", "equals", "(Ljava/lang/Object;)Z");
    let stream_mode = pool.string(VerifierEntry::CapStream.mode());
    let system_err = pool.field("java/lang/System", "err", "Ljava/io/PrintStream;");
    let println = pool.method("java/io/PrintStream", "println", "(Ljava/lang/Object;)V");
    let exit = pool.method("java/lang/System", "exit", "(I)V");
    let vector = pool.class("java/util/Vector");
    let file = pool.class("java/io/File");
    let file_init = pool.method("java/io/File", "<init>", "(Ljava/lang/String;)V");
    let linkage_error = pool.class("java/lang/LinkageError");
    let throwable = pool.class("java/lang/Throwable");

    let mut code = Code::default();

    // Vector exports = new Vector(); for (i = 3; i < args.length; i++) exports.add(new File(args[i]));
    code.op_index(NEW, vector);
    code.ops(&[DUP]);
    code.op_index(INVOKESPECIAL, vector_init);
    code.ops(&[ASTORE_1, FIRST_EXPORT_ARG, ISTORE_2]);
    let loop_start = code.pos();
    code.ops(&[ILOAD_2, ALOAD_0, ARRAYLENGTH]);
    let loop_exit = code.branch(IF_ICMPGE);
    code.ops(&[ALOAD_1]);
    code.op_index(NEW, file);
    code.ops(&[DUP, ALOAD_0, ILOAD_2, AALOAD]);
    code.op_index(INVOKESPECIAL, file_init);
    code.op_index(INVOKEVIRTUAL, vector_add);
    code.ops(&[POP, IINC, 2, 1]);
    code.branch_back(GOTO, loop_start);
    code.land(loop_exit);

    // if (args[0].equals("stream")) verifyCap(new FileInputStream(args[2]), ...) else verifyCap(new File(args[2]), ...)
    let try_start = code.pos();
    code.ops(&[ALOAD_0, ICONST_0, AALOAD]);
    code.op_index(LDC_W, stream_mode);
    code.op_index(INVOKEVIRTUAL, string_equals);
    let to_path = code.branch(IFEQ);
    call_verify_cap(&mut code, pool, &verifier, VerifierEntry::CapStream);
    let done = code.branch(GOTO);
    code.land(to_path);
    call_verify_cap(&mut code, pool, &verifier, VerifierEntry::CapPath);
    code.land(done);
    let try_end = code.pos();
    code.ops(&[RETURN]);

    // catch: System.err.println(e); System.exit(status);
    let mut handlers = Vec::with_capacity(2);
    for (catch_type, status) in [
        (linkage_error, exit_status_op(EXIT_LINKAGE)),
        (throwable, exit_status_op(EXIT_REJECTED)),
    ] {
        handlers.push(Handler {
            start: try_start,
            end: try_end,
            handler: code.pos(),
            catch_type,
        });
        code.op_index(GETSTATIC, system_err);
        code.ops(&[SWAP]);
        code.op_index(INVOKEVIRTUAL, println);
        code.ops(&[status]);
        code.op_index(INVOKESTATIC, exit);
        code.ops(&[RETURN]);
    }

    (code, handlers)
}

/// `Verifier.verifyCap(new <cap class>(args[2]), args[1], exports)`.
fn call_verify_cap(code: &mut Code, pool: &mut ConstantPool, verifier: &str, entry: VerifierEntry) {
    let cap_class = entry.cap_class();
    let cap = pool.class(cap_class);
    let cap_init = pool.method(cap_class, "<init>", "(Ljava/lang/String;)V");
    let verify_cap = pool.method(verifier, "verifyCap", entry.descriptor());

    code.op_index(NEW, cap);
    code.ops(&[DUP, ALOAD_0, ICONST_2, AALOAD]);
    code.op_index(INVOKESPECIAL, cap_init);
    code.ops(&[ALOAD_0, ICONST_1, AALOAD, ALOAD_1]);
    code.op_index(INVOKESTATIC, verify_cap);
}

/// `iconst_<status>` for a small exit status.
const fn exit_status_op(status: i32) -> u8 {
    ICONST_0 + status as u8
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}
