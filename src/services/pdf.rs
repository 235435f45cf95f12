// PDF generation for resume downloads: LaTeX compilation when a TeX engine
// is installed, a plain printpdf rendition otherwise.
use printpdf::*;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::common::helpers::escape_html;

const COMPILERS: &[&str] = &["xelatex", "lualatex", "pdflatex"];
const COMPILE_TIMEOUT: Duration = Duration::from_secs(60);
const DETECT_TIMEOUT: Duration = Duration::from_secs(5);
const WRAP_CHARS: usize = 90;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("No LaTeX compiler available")]
    CompilerUnavailable,

    #[error("LaTeX compilation error (using {compiler}): {log}")]
    Compilation { compiler: String, log: String },

    #[error("LaTeX compilation timed out")]
    Timeout,

    #[error("PDF file was not generated")]
    MissingOutput,

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A TeX engine found on PATH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatexCompiler {
    pub program: String,
}

impl LatexCompiler {
    /// Tries xelatex, lualatex and pdflatex in that order
    pub async fn detect() -> Option<Self> {
        for program in COMPILERS {
            let check = Command::new(program)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status();

            match tokio::time::timeout(DETECT_TIMEOUT, check).await {
                Ok(Ok(status)) if status.success() => {
                    info!(compiler = %program, "LaTeX compiler detected");
                    return Some(Self {
                        program: program.to_string(),
                    });
                }
                _ => debug!(compiler = %program, "LaTeX compiler not available"),
            }
        }
        None
    }

    /// Compiles a document in a scratch directory and returns the PDF bytes.
    /// Runs twice so cross references settle.
    pub async fn compile(&self, latex: &str) -> Result<Vec<u8>, PdfError> {
        let workdir = tempfile::tempdir()?;
        let tex_path = workdir.path().join("resume.tex");
        let pdf_path = workdir.path().join("resume.pdf");
        tokio::fs::write(&tex_path, latex).await?;

        for pass in 1..=2 {
            let run = Command::new(&self.program)
                .arg("-interaction=nonstopmode")
                .arg("-halt-on-error")
                .arg("-output-directory")
                .arg(workdir.path())
                .arg(&tex_path)
                .current_dir(workdir.path())
                .kill_on_drop(true)
                .output();

            let output = tokio::time::timeout(COMPILE_TIMEOUT, run)
                .await
                .map_err(|_| PdfError::Timeout)??;

            if !output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let tail: String = stdout
                    .lines()
                    .rev()
                    .take(20)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect::<Vec<_>>()
                    .join("\n");
                warn!(compiler = %self.program, pass, "LaTeX compilation failed");
                return Err(PdfError::Compilation {
                    compiler: self.program.clone(),
                    log: tail,
                });
            }
        }

        match tokio::fs::read(&pdf_path).await {
            Ok(bytes) => Ok(bytes),
            Err(_) => Err(PdfError::MissingOutput),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfService {
    compiler: Option<LatexCompiler>,
}

impl PdfService {
    pub fn new(compiler: Option<LatexCompiler>) -> Self {
        Self { compiler }
    }

    pub async fn detect() -> Self {
        let compiler = LatexCompiler::detect().await;
        if compiler.is_none() {
            info!("No LaTeX compiler found, PDFs will use the built-in renderer");
        }
        Self::new(compiler)
    }

    pub fn has_compiler(&self) -> bool {
        self.compiler.is_some()
    }

    pub async fn compile_latex(&self, latex: &str) -> Result<Vec<u8>, PdfError> {
        match &self.compiler {
            Some(compiler) => compiler.compile(latex).await,
            None => Err(PdfError::CompilerUnavailable),
        }
    }

    /// Renders plain text onto A4 pages with Helvetica.
    ///
    /// Synchronous: printpdf documents are not `Send`, so callers run this
    /// on the blocking pool.
    pub fn render_text_pdf(title: &str, text: &str) -> Result<Vec<u8>, PdfError> {
        let render_err = |e: printpdf::Error| PdfError::Render(e.to_string());

        let (doc, page1, layer1) = PdfDocument::new(title, Mm(210.0), Mm(297.0), "Layer 1");
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;
        let font_regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?;

        let left_margin = Mm(20.0);
        let top = Mm(277.0);
        let bottom = Mm(20.0);

        let mut layer = doc.get_page(page1).get_layer(layer1);
        let mut current_y = top;

        layer.use_text(to_winansi(title), 16.0, left_margin, current_y, &font_bold);
        current_y -= Mm(12.0);

        for paragraph in text.lines() {
            let lines = wrap_text(paragraph, WRAP_CHARS);
            if lines.is_empty() {
                current_y -= Mm(3.0);
                continue;
            }

            for line in lines {
                if current_y < bottom {
                    let (page, layer_idx) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
                    layer = doc.get_page(page).get_layer(layer_idx);
                    current_y = top;
                }
                layer.use_text(to_winansi(&line), 10.0, left_margin, current_y, &font_regular);
                current_y -= Mm(5.0);
            }
        }

        doc.save_to_bytes().map_err(render_err)
    }
}

/// Builtin PDF fonts only cover Latin-1
fn to_winansi(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '*',
            c if (c as u32) < 0x100 && !c.is_control() => c,
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap at `max_chars`
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let pending = current_line.chars().count() + word.chars().count() + 1;
        if pending > max_chars && !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}

// =============================================================================
// LaTeX helpers
// =============================================================================

pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Minimal article-class resume used when no model is available
pub fn basic_latex_template(
    name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    sections: &[(String, String)],
) -> String {
    let mut doc = String::from(
        "\\documentclass[10pt, letterpaper]{article}\n\
         \\usepackage[top=2cm, bottom=2cm, left=2cm, right=2cm]{geometry}\n\
         \\usepackage{titlesec}\n\
         \\usepackage{enumitem}\n\
         \\usepackage[hidelinks]{hyperref}\n\
         \\pagestyle{empty}\n\
         \\setlength{\\parindent}{0pt}\n\
         \\titleformat{\\section}{\\bfseries\\large}{}{0pt}{}[\\titlerule]\n\
         \\begin{document}\n",
    );

    doc.push_str(&format!(
        "\\begin{{center}}\n{{\\LARGE \\textbf{{{}}}}}\\\\\n",
        escape_latex(name)
    ));
    let contact: Vec<String> = [email, phone]
        .into_iter()
        .flatten()
        .map(escape_latex)
        .collect();
    if !contact.is_empty() {
        doc.push_str(&contact.join(" | "));
        doc.push_str("\\\\\n");
    }
    doc.push_str("\\end{center}\n\n");

    for (heading, body) in sections {
        if body.trim().is_empty() {
            continue;
        }
        doc.push_str(&format!("\\section{{{}}}\n", escape_latex(heading)));
        for paragraph in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            doc.push_str(&escape_latex(paragraph));
            doc.push_str("\\\\\n");
        }
        doc.push('\n');
    }

    doc.push_str("\\end{document}\n");
    doc
}

/// Argument of the first `command{...}` on the line, honouring nested braces
fn command_argument(line: &str, command: &str) -> Option<String> {
    let start = line.find(command)? + command.len();
    let mut depth = 0usize;
    let mut content = String::new();

    for c in line[start..].chars() {
        match c {
            '{' => {
                depth += 1;
                content.push(c);
            }
            '}' if depth == 0 => return Some(content.trim().to_string()),
            '}' => {
                depth -= 1;
                content.push(c);
            }
            _ => content.push(c),
        }
    }
    Some(content.trim().to_string())
}

/// Escapes a text fragment, then maps `\textbf` / `\textit` / `\emph` to
/// inline HTML and drops any other commands
fn inline_latex_to_html(fragment: &str) -> String {
    let mut out = String::new();
    let mut rest = fragment;

    while let Some(idx) = rest.find('\\') {
        out.push_str(&escape_html(&rest[..idx].replace(['{', '}'], "")));
        let after = &rest[idx + 1..];
        let cmd_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());

        if cmd_len == 0 {
            // escaped symbol such as \& or \%
            let mut chars = after.chars();
            match chars.next() {
                Some('\\') | None => {}
                Some(c) => out.push_str(&escape_html(&c.to_string())),
            }
            rest = chars.as_str();
            continue;
        }

        let cmd = &after[..cmd_len];
        let tail = &after[cmd_len..];
        let tag = match cmd {
            "textbf" => Some("strong"),
            "textit" | "emph" => Some("em"),
            _ => None,
        };

        match (tag, tail.starts_with('{')) {
            (Some(tag), true) => {
                let arg = command_argument(tail, "{").unwrap_or_default();
                out.push_str(&format!("<{tag}>{}</{tag}>", inline_latex_to_html(&arg)));
                rest = skip_group(tail);
            }
            (None, true) if !matches!(cmd, "textbackslash" | "textasciitilde" | "textasciicircum") => {
                let arg = command_argument(tail, "{").unwrap_or_default();
                out.push_str(&inline_latex_to_html(&arg));
                rest = skip_group(tail);
            }
            _ => {
                rest = tail.strip_prefix("{}").unwrap_or(tail);
            }
        }
    }

    out.push_str(&escape_html(&rest.replace(['{', '}'], "")));
    out.trim().to_string()
}

/// Skips one balanced `{...}` group at the start of `text`
fn skip_group(text: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[i + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

const PREVIEW_STYLE: &str = "body{font-family:'Times New Roman',serif;font-size:11pt;line-height:1.4;margin:0;padding:20px}\
h1{text-align:center;font-size:18pt;margin-bottom:5px}\
h2{font-size:12pt;text-transform:uppercase;border-bottom:1px solid #333;margin:15px 0 8px;padding-bottom:2px}\
ul{margin:5px 0;padding-left:20px}li{margin:2px 0}";

/// Rough LaTeX to HTML conversion for previews.
///
/// Input without document markers is treated as body text.
pub fn latex_to_html(latex: &str) -> String {
    let has_markers = latex.contains("\\begin{document}") || latex.contains("\\end{document}");
    let mut in_document = !has_markers;
    let mut in_list = false;
    let mut body = String::new();

    for raw in latex.lines() {
        let line = raw.trim();

        if line.contains("\\begin{document}") {
            in_document = true;
            continue;
        }
        if line.contains("\\end{document}") {
            break;
        }
        if !in_document || line.is_empty() || line.starts_with('%') {
            continue;
        }

        if line.starts_with("\\begin{itemize}") || line.starts_with("\\begin{highlights}") {
            if !in_list {
                body.push_str("<ul>");
                in_list = true;
            }
            continue;
        }
        if line.starts_with("\\end{itemize}") || line.starts_with("\\end{highlights}") {
            if in_list {
                body.push_str("</ul>");
                in_list = false;
            }
            continue;
        }

        if let Some(item) = line.strip_prefix("\\item") {
            let text = inline_latex_to_html(item);
            if !in_list {
                body.push_str("<ul>");
                in_list = true;
            }
            body.push_str(&format!("<li>{}</li>", text));
            continue;
        }

        if in_list {
            body.push_str("</ul>");
            in_list = false;
        }

        let heading = ["\\section*{", "\\section{", "\\subsection*{", "\\subsection{"]
            .iter()
            .find_map(|cmd| line.starts_with(cmd).then(|| (cmd.contains("sub"), *cmd)));
        if let Some((is_sub, cmd)) = heading {
            let title = command_argument(line, cmd).unwrap_or_default();
            let tag = if is_sub { "h3" } else { "h2" };
            body.push_str(&format!("<{tag}>{}</{tag}>", inline_latex_to_html(&title)));
            continue;
        }

        if line.starts_with("\\name{") {
            let name = command_argument(line, "\\name{").unwrap_or_default();
            body.push_str(&format!("<h1>{}</h1>", inline_latex_to_html(&name)));
            continue;
        }

        // layout commands carry no preview text
        if line.starts_with('\\') && !line.contains("\\textbf{") && !line.contains("\\textit{") {
            continue;
        }

        let text = inline_latex_to_html(line.trim_end_matches("\\\\"));
        if !text.is_empty() {
            body.push_str(&format!("<p>{}</p>", text));
        }
    }

    if in_list {
        body.push_str("</ul>");
    }

    if body.is_empty() {
        body = latex
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| format!("<p>{}</p>", escape_html(l)))
            .collect();
    }

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><style>{}</style></head><body>{}</body></html>",
        PREVIEW_STYLE, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        let text = "This is a long line of text that should be wrapped into multiple lines based on the maximum character width specified.";
        let lines = wrap_text(text, 30);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 30);
        }
        assert!(wrap_text("   ", 30).is_empty());
    }

    #[test]
    fn test_render_text_pdf_produces_pdf() {
        let text = (0..200)
            .map(|i| format!("Line {} of a long résumé – with “quotes”", i))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = PdfService::render_text_pdf("Jane Doe", &text).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_to_winansi() {
        assert_eq!(to_winansi("a–b “c” é ☃"), "a-b \"c\" é ?");
    }

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("R&D 100% $5 #1 a_b"), r"R\&D 100\% \$5 \#1 a\_b");
        assert_eq!(escape_latex(r"\~^"), r"\textbackslash{}\textasciitilde{}\textasciicircum{}");
    }

    #[test]
    fn test_basic_template_shape() {
        let sections = vec![
            ("Summary".to_string(), "Engineer & builder".to_string()),
            ("Empty".to_string(), "  ".to_string()),
        ];
        let doc = basic_latex_template("Jane Doe", Some("jane@example.com"), None, &sections);
        assert!(doc.starts_with("\\documentclass"));
        assert!(doc.trim_end().ends_with("\\end{document}"));
        assert!(doc.contains("\\section{Summary}"));
        assert!(doc.contains("Engineer \\& builder"));
        assert!(!doc.contains("\\section{Empty}"));
        assert!(!doc.contains("moderncv"));
    }

    #[test]
    fn test_latex_to_html_structure() {
        let latex = "\\documentclass{article}\n\\usepackage{geometry}\n\\begin{document}\n\
            \\section{Experience}\n\\textbf{Acme} -- \\textit{Engineer}\n\
            \\begin{itemize}\n\\item Built \\textbf{fast} APIs \\& tools\n\\end{itemize}\n\
            Plain <text>\n\\end{document}";
        let html = latex_to_html(latex);

        assert!(html.contains("<h2>Experience</h2>"));
        assert!(html.contains("<strong>Acme</strong>"));
        assert!(html.contains("<em>Engineer</em>"));
        assert!(html.contains("<ul><li>Built <strong>fast</strong> APIs &amp; tools</li></ul>"));
        assert!(html.contains("<p>Plain &lt;text&gt;</p>"));
        assert!(!html.contains("usepackage"));
    }

    #[test]
    fn test_latex_to_html_plain_text() {
        let html = latex_to_html("Just some text\nSecond line");
        assert!(html.contains("<p>Just some text</p><p>Second line</p>"));
    }

    #[test]
    fn test_command_argument_nested() {
        assert_eq!(
            command_argument("\\section{A {B} C} tail", "\\section{").as_deref(),
            Some("A {B} C")
        );
    }

    #[tokio::test]
    async fn test_compile_with_missing_engine_reports_io_error() {
        let compiler = LatexCompiler {
            program: "no-such-tex-engine-xyz".to_string(),
        };
        let service = PdfService::new(Some(compiler));
        assert!(service.has_compiler());
        assert!(matches!(
            service.compile_latex("\\documentclass{article}").await,
            Err(PdfError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_compile_without_compiler() {
        let service = PdfService::new(None);
        assert!(!service.has_compiler());
        assert!(matches!(
            service.compile_latex("\\documentclass{article}").await,
            Err(PdfError::CompilerUnavailable)
        ));
    }
}
