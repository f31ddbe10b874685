//! Type expression printing

use super::{align_rows, Printer};
use goder_parser::ast::*;

impl Printer {
    /// Print a type; non-empty struct and interface types span lines.
    pub fn type_expr(&mut self, ty: &TypeExpr) {
        self.ty(ty, false);
    }

    /// Print a type on a single line (`struct{ X int }`).
    pub fn type_expr_inline(&mut self, ty: &TypeExpr) {
        self.ty(ty, true);
    }

    pub(super) fn type_params(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.word("[");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            for (j, name) in param.names.iter().enumerate() {
                if j > 0 {
                    self.word(", ");
                }
                self.word(&name.name);
            }
            self.word(" ");
            self.type_expr_inline(&param.constraint);
        }
        self.word("]");
    }

    pub(super) fn signature(&mut self, sig: &Signature) {
        self.word("(");
        self.fields(&sig.params);
        self.word(")");
        match sig.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.word(" ");
                self.type_expr(&single.ty);
            }
            results => {
                self.word(" (");
                self.fields(results);
                self.word(")");
            }
        }
    }

    fn fields(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            if !field.names.is_empty() {
                self.word(&names(field));
                self.word(" ");
            }
            self.type_expr(&field.ty);
        }
    }

    fn ty(&mut self, ty: &TypeExpr, inline: bool) {
        match ty {
            TypeExpr::Named(id) => self.word(&id.name),
            TypeExpr::Qualified { package, name } => {
                self.word(&package.name);
                self.word(".");
                self.word(&name.name);
            }
            TypeExpr::Pointer(inner) => {
                self.word("*");
                self.ty(inner, inline);
            }
            TypeExpr::Slice(elem) => {
                self.word("[]");
                self.ty(elem, inline);
            }
            TypeExpr::Array { len, elem } => {
                self.word("[");
                match len {
                    Some(len) => self.expr(len),
                    None => self.word("..."),
                }
                self.word("]");
                self.ty(elem, inline);
            }
            TypeExpr::Map { key, value } => {
                self.word("map[");
                self.ty(key, inline);
                self.word("]");
                self.ty(value, inline);
            }
            TypeExpr::Chan { dir, elem } => {
                match dir {
                    ChanDir::Both => self.word("chan "),
                    ChanDir::Send => self.word("chan<- "),
                    ChanDir::Recv => self.word("<-chan "),
                }
                let wrap = *dir == ChanDir::Both
                    && matches!(elem.as_ref(), TypeExpr::Chan { dir: ChanDir::Recv, .. });
                if wrap {
                    self.word("(");
                }
                self.ty(elem, inline);
                if wrap {
                    self.word(")");
                }
            }
            TypeExpr::Func(sig) => {
                self.word("func");
                self.signature(sig);
            }
            TypeExpr::Instantiated { base, args } => {
                self.ty(base, inline);
                self.word("[");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.word(", ");
                    }
                    self.ty(arg, inline);
                }
                self.word("]");
            }
            TypeExpr::Struct(fields) if fields.is_empty() => self.word("struct{}"),
            TypeExpr::Struct(fields) if inline => {
                self.word("struct{ ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.word("; ");
                    }
                    let row = self.struct_field_row(field, true);
                    self.word(&row.join(" "));
                }
                self.word(" }");
            }
            TypeExpr::Struct(fields) => {
                self.word("struct {");
                self.newline();
                self.indent += 1;
                let rows: Vec<Vec<String>> = fields
                    .iter()
                    .map(|f| self.struct_field_row(f, false))
                    .collect();
                for line in align_rows(&rows) {
                    self.tabs();
                    self.word(&line);
                    self.newline();
                }
                self.indent -= 1;
                self.tabs();
                self.word("}");
            }
            TypeExpr::Interface(elems) if elems.is_empty() => self.word("interface{}"),
            TypeExpr::Interface(elems) if inline => {
                self.word("interface{ ");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        self.word("; ");
                    }
                    self.interface_elem(elem);
                }
                self.word(" }");
            }
            TypeExpr::Interface(elems) => {
                self.word("interface {");
                self.newline();
                self.indent += 1;
                for elem in elems {
                    self.tabs();
                    self.interface_elem(elem);
                    self.newline();
                }
                self.indent -= 1;
                self.tabs();
                self.word("}");
            }
            TypeExpr::Ellipsis(elem) => {
                self.word("...");
                self.ty(elem, inline);
            }
            TypeExpr::Union(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        self.word(" | ");
                    }
                    if term.tilde {
                        self.word("~");
                    }
                    self.ty(&term.ty, inline);
                }
            }
        }
    }

    fn interface_elem(&mut self, elem: &InterfaceElem) {
        match elem {
            InterfaceElem::Method { name, sig } => {
                self.word(&name.name);
                self.signature(sig);
            }
            InterfaceElem::Type(ty) => self.type_expr_inline(ty),
        }
    }

    /// Cells of one struct field line: names, type, tag.
    fn struct_field_row(&self, field: &Field, inline: bool) -> Vec<String> {
        let mut printer = Printer::with_indent(self.indent);
        printer.ty(&field.ty, inline);
        let mut row = Vec::new();
        if !field.names.is_empty() {
            row.push(names(field));
        }
        row.push(printer.finish());
        if let Some(tag) = &field.tag {
            row.push(tag.clone());
        }
        row
    }
}

fn names(field: &Field) -> String {
    field
        .names
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
