//! gofmt-style printer
//!
//! Output uses tabs for indentation and spaces for alignment. Line breaks
//! inside call argument lists and composite literals follow the source:
//! when the first element starts on a later line than the expression, every
//! element gets its own line with a trailing comma.

mod expr;
mod types;

use goder_parser::ast::*;

/// Accumulates printed source.
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A printer whose nested lines start at `indent` tabs.
    pub fn with_indent(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn word(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn tabs(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    /// Render with a fresh printer at the current indentation.
    fn nested(&self, f: impl FnOnce(&mut Printer)) -> String {
        let mut printer = Printer::with_indent(self.indent);
        f(&mut printer);
        printer.finish()
    }

    // ------------------------------------------------------------------
    // Files and declarations
    // ------------------------------------------------------------------

    pub fn source_file(&mut self, file: &SourceFile) {
        self.word("package ");
        self.word(&file.package.name);
        self.newline();

        if !file.imports.is_empty() {
            self.newline();
            self.imports(&file.imports);
        }

        for decl in &file.decls {
            self.newline();
            self.decl(decl);
            self.newline();
        }
    }

    fn imports(&mut self, imports: &[ImportSpec]) {
        if let [single] = imports {
            self.word("import ");
            self.import_spec(single);
            self.newline();
            return;
        }

        self.word("import (");
        self.newline();
        self.indent += 1;
        let mut previous_std = None;
        for spec in imports {
            let is_std = is_std_path(&spec.path);
            if previous_std.is_some_and(|prev| prev != is_std) {
                self.newline();
            }
            previous_std = Some(is_std);
            self.tabs();
            self.import_spec(spec);
            self.newline();
        }
        self.indent -= 1;
        self.word(")");
        self.newline();
    }

    fn import_spec(&mut self, spec: &ImportSpec) {
        if let Some(name) = &spec.name {
            self.word(name);
            self.word(" ");
        }
        self.word("\"");
        self.word(&spec.path);
        self.word("\"");
    }

    /// Print a declaration starting at the current position.
    pub fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => self.func_decl(func),
            Decl::Type(spec) => self.type_spec(spec),
            Decl::Var(group) => self.value_decl("var", group),
            Decl::Const(group) => self.value_decl("const", group),
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.word("func ");
        if let Some(recv) = &func.recv {
            self.word("(");
            if let Some(name) = &recv.name {
                self.word(&name.name);
                self.word(" ");
            }
            self.type_expr(&recv.ty);
            self.word(") ");
        }
        self.word(&func.name.name);
        self.type_params(&func.type_params);
        self.signature(&func.sig);
        if let Some(body) = &func.body {
            self.word(" ");
            self.block(body);
        }
    }

    fn type_spec(&mut self, spec: &TypeSpec) {
        self.word("type ");
        self.word(&spec.name.name);
        self.type_params(&spec.type_params);
        self.word(if spec.alias { " = " } else { " " });
        self.type_expr(&spec.ty);
    }

    fn value_decl(&mut self, keyword: &str, group: &ValueDecl) {
        self.word(keyword);
        if !group.grouped {
            for spec in &group.specs {
                self.word(" ");
                self.value_spec(spec);
            }
            return;
        }

        self.word(" (");
        self.newline();
        self.indent += 1;
        let rows: Vec<Vec<String>> = group
            .specs
            .iter()
            .map(|spec| {
                let names = ident_list(&spec.names);
                let rest = self.nested(|p| p.value_spec_tail(spec));
                if rest.is_empty() {
                    vec![names]
                } else {
                    vec![names, rest]
                }
            })
            .collect();
        for line in align_rows(&rows) {
            self.tabs();
            self.word(&line);
            self.newline();
        }
        self.indent -= 1;
        self.tabs();
        self.word(")");
    }

    fn value_spec(&mut self, spec: &ValueSpec) {
        self.word(&ident_list(&spec.names));
        let tail = self.nested(|p| p.value_spec_tail(spec));
        if !tail.is_empty() {
            self.word(" ");
            self.word(&tail);
        }
    }

    /// `T = a, b` after the names of a value spec.
    fn value_spec_tail(&mut self, spec: &ValueSpec) {
        if let Some(ty) = &spec.ty {
            self.type_expr(ty);
            if !spec.values.is_empty() {
                self.word(" ");
            }
        }
        if !spec.values.is_empty() {
            self.word("= ");
            self.expr_list(&spec.values, 1);
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Print `{`, the statements one level deeper, and `}`.
    pub fn block(&mut self, block: &Block) {
        self.word("{");
        self.newline();
        self.indent += 1;
        self.stmt_lines(&block.stmts);
        self.indent -= 1;
        self.tabs();
        self.word("}");
    }

    fn stmt_lines(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if matches!(stmt, Stmt::Empty) {
                continue;
            }
            self.stmt_line(stmt);
        }
    }

    fn stmt_line(&mut self, stmt: &Stmt) {
        if let Stmt::Labeled { label, stmt } = stmt {
            self.indent = self.indent.saturating_sub(1);
            self.tabs();
            self.indent += 1;
            self.word(&label.name);
            self.word(":");
            self.newline();
            if !matches!(stmt.as_ref(), Stmt::Empty) {
                self.stmt_line(stmt);
            }
            return;
        }
        self.tabs();
        self.stmt(stmt);
        self.newline();
    }

    /// Print one statement without indentation or trailing newline.
    pub fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.decl(decl),
            Stmt::Assign(assign) => {
                let depth = if assign.lhs.len() > 1 && assign.rhs.len() > 1 {
                    2
                } else {
                    1
                };
                self.expr_list(&assign.lhs, depth);
                self.word(" ");
                self.word(&assign.op.to_string());
                self.word(" ");
                self.expr_list(&assign.rhs, depth);
            }
            Stmt::IncDec { expr, inc } => {
                self.expr(expr);
                self.word(if *inc { "++" } else { "--" });
            }
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Send { chan, value } => {
                self.expr(chan);
                self.word(" <- ");
                self.expr(value);
            }
            Stmt::Return { results, .. } => {
                self.word("return");
                if !results.is_empty() {
                    self.word(" ");
                    self.expr_list(results, 1);
                }
            }
            Stmt::Block(block) => self.block(block),
            Stmt::If(stmt) => self.if_stmt(stmt),
            Stmt::For(stmt) => self.for_stmt(stmt),
            Stmt::Range(stmt) => self.range_stmt(stmt),
            Stmt::Switch(stmt) => self.switch_stmt(stmt),
            Stmt::TypeSwitch(stmt) => self.type_switch_stmt(stmt),
            Stmt::Select(stmt) => {
                self.word("select {");
                self.newline();
                for case in &stmt.cases {
                    self.tabs();
                    match &case.comm {
                        Some(comm) => {
                            self.word("case ");
                            self.stmt(comm);
                            self.word(":");
                        }
                        None => self.word("default:"),
                    }
                    self.newline();
                    self.case_body(&case.body);
                }
                self.tabs();
                self.word("}");
            }
            Stmt::Branch { kind, label, .. } => {
                self.word(&kind.to_string());
                if let Some(label) = label {
                    self.word(" ");
                    self.word(&label.name);
                }
            }
            Stmt::Labeled { label, stmt } => {
                self.word(&label.name);
                self.word(": ");
                self.stmt(stmt);
            }
            Stmt::Go(expr) => {
                self.word("go ");
                self.expr(expr);
            }
            Stmt::Defer(expr) => {
                self.word("defer ");
                self.expr(expr);
            }
            Stmt::Empty => {}
        }
    }

    fn if_stmt(&mut self, stmt: &IfStmt) {
        self.word("if ");
        if let Some(init) = &stmt.init {
            self.stmt(init);
            self.word("; ");
        }
        self.expr(&stmt.cond);
        self.word(" ");
        self.block(&stmt.then);
        if let Some(els) = &stmt.els {
            self.word(" else ");
            match els.as_ref() {
                Stmt::If(nested) => self.if_stmt(nested),
                Stmt::Block(block) => self.block(block),
                other => self.stmt(other),
            }
        }
    }

    fn for_stmt(&mut self, stmt: &ForStmt) {
        self.word("for ");
        match (&stmt.init, &stmt.cond, &stmt.post) {
            (None, None, None) => {}
            (None, Some(cond), None) => {
                self.expr(cond);
                self.word(" ");
            }
            (init, cond, post) => {
                if let Some(init) = init {
                    self.stmt(init);
                }
                self.word("; ");
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                self.word(";");
                if let Some(post) = post {
                    self.word(" ");
                    self.stmt(post);
                }
                self.word(" ");
            }
        }
        self.block(&stmt.body);
    }

    fn range_stmt(&mut self, stmt: &RangeStmt) {
        self.word("for ");
        if let Some(key) = &stmt.key {
            self.expr(key);
            if let Some(value) = &stmt.value {
                self.word(", ");
                self.expr(value);
            }
            self.word(if stmt.define { " := " } else { " = " });
        }
        self.word("range ");
        self.expr(&stmt.expr);
        self.word(" ");
        self.block(&stmt.body);
    }

    fn switch_stmt(&mut self, stmt: &SwitchStmt) {
        self.word("switch ");
        if let Some(init) = &stmt.init {
            self.stmt(init);
            self.word("; ");
        }
        if let Some(tag) = &stmt.tag {
            self.expr(tag);
            self.word(" ");
        }
        self.word("{");
        self.newline();
        for case in &stmt.cases {
            self.tabs();
            match &case.exprs {
                Some(exprs) => {
                    self.word("case ");
                    self.expr_list(exprs, 1);
                    self.word(":");
                }
                None => self.word("default:"),
            }
            self.newline();
            self.case_body(&case.body);
        }
        self.tabs();
        self.word("}");
    }

    fn type_switch_stmt(&mut self, stmt: &TypeSwitchStmt) {
        self.word("switch ");
        if let Some(init) = &stmt.init {
            self.stmt(init);
            self.word("; ");
        }
        if let Some(binding) = &stmt.binding {
            self.word(&binding.name);
            self.word(" := ");
        }
        self.expr(&stmt.expr);
        self.word(".(type) {");
        self.newline();
        for case in &stmt.cases {
            self.tabs();
            match &case.types {
                Some(types) => {
                    self.word("case ");
                    for (i, ty) in types.iter().enumerate() {
                        if i > 0 {
                            self.word(", ");
                        }
                        self.type_expr(ty);
                    }
                    self.word(":");
                }
                None => self.word("default:"),
            }
            self.newline();
            self.case_body(&case.body);
        }
        self.tabs();
        self.word("}");
    }

    fn case_body(&mut self, body: &[Stmt]) {
        self.indent += 1;
        self.stmt_lines(body);
        self.indent -= 1;
    }
}

fn ident_list(names: &[Ident]) -> String {
    names
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_std_path(path: &str) -> bool {
    !path.split('/').next().is_some_and(|first| first.contains('.'))
}

/// Join cells into lines, padding each column to a common width within runs
/// of consecutive rows that have a cell after it. A row whose last cell
/// spans several lines ends the run.
pub(crate) fn align_rows(rows: &[Vec<String>]) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths: Vec<Vec<usize>> = rows.iter().map(|r| vec![0; r.len()]).collect();
    let has_cell = |row: &Vec<String>, col: usize| row.len() > col + 1;
    let ends_run = |row: &Vec<String>| row.last().is_some_and(|cell| cell.contains('\n'));

    for col in 0..columns.saturating_sub(1) {
        let mut start = 0;
        while start < rows.len() {
            if !has_cell(&rows[start], col) {
                start += 1;
                continue;
            }
            let mut end = start + 1;
            while end < rows.len() && has_cell(&rows[end], col) && !ends_run(&rows[end - 1]) {
                end += 1;
            }
            let width = rows[start..end]
                .iter()
                .map(|r| r[col].chars().count())
                .max()
                .unwrap_or(0);
            for row_widths in &mut widths[start..end] {
                row_widths[col] = width;
            }
            start = end;
        }
    }

    rows.iter()
        .zip(widths)
        .map(|(row, row_widths)| {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i + 1 == row.len() {
                    line.push_str(cell);
                } else {
                    line.push_str(cell);
                    let pad = row_widths[i].saturating_sub(cell.chars().count());
                    line.push_str(&" ".repeat(pad + 1));
                }
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(source: &str) -> String {
        crate::render(&goder_parser::parse(source).unwrap())
    }

    #[test]
    fn test_align_rows() {
        let rows = vec![
            vec!["\"a\":".to_string(), "1,".to_string()],
            vec!["\"bcd\":".to_string(), "2,".to_string()],
        ];
        assert_eq!(align_rows(&rows), vec!["\"a\":   1,", "\"bcd\": 2,"]);
    }

    #[test]
    fn test_align_rows_breaks_after_multiline_cell() {
        let rows = vec![
            vec!["a:".to_string(), "func() {\n}".to_string()],
            vec!["long:".to_string(), "1,".to_string()],
        ];
        let lines = align_rows(&rows);
        assert_eq!(lines[0], "a: func() {\n}");
        assert_eq!(lines[1], "long: 1,");
    }

    #[test]
    fn test_imports_grouped() {
        let out = format(
            "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/samber/lo\"\n)\n",
        );
        assert_eq!(
            out,
            "package main\n\nimport (\n\t\"fmt\"\n\n\t\"github.com/samber/lo\"\n)\n"
        );
    }

    #[test]
    fn test_single_import() {
        let out = format("package main\nimport \"fmt\"\nfunc main() { fmt.Println() }\n");
        assert_eq!(
            out,
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println()\n}\n"
        );
    }

    #[test]
    fn test_value_group_alignment() {
        let out = format("package main\n\nvar (\n\tx, y = 1, 2\n\tz []string\n)\n");
        assert_eq!(
            out,
            "package main\n\nvar (\n\tx, y = 1, 2\n\tz    []string\n)\n"
        );
    }

    #[test]
    fn test_control_flow() {
        let source = "package main

func f(xs []int) int {
	n := 0
	for i := 0; i < len(xs); i++ {
		if xs[i] > 0 {
			n++
		} else if xs[i] < 0 {
			n--
		} else {
			continue
		}
	}
	for _, x := range xs {
		switch {
		case x > 10:
			return x
		default:
		}
	}
	for {
		break
	}
	return n
}
";
        assert_eq!(format(source), source);
    }

    #[test]
    fn test_labeled_loop() {
        let source = "package main

func f() {
outer:
	for {
		for {
			break outer
		}
	}
}
";
        assert_eq!(format(source), source);
    }
}
