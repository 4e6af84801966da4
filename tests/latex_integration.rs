use github_portfolio::github::Repository;
use github_portfolio::latex;
use github_portfolio::markdown::{classify_document, tokenize, ContentBlock, StyledRun};
use github_portfolio::portfolio::{build_sections, Portfolio};
use github_portfolio::render_pdf;
use github_portfolio::styling::LayoutStyle;
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::collections::HashMap;

fn math_portfolio(readme: &str) -> Portfolio {
    let repos = vec![Repository {
        name: "formulas".to_string(),
        description: Some("Notes with math".to_string()),
        html_url: "https://github.com/octocat/formulas".to_string(),
        stargazers_count: 1,
    }];
    let mut readmes = HashMap::new();
    readmes.insert("formulas".to_string(), readme.to_string());
    Portfolio::new("octocat", build_sections(&repos, None, &readmes).unwrap())
}

/// Text of every `Tj` operator in the document, paired with the font resource in use.
fn texts_with_fonts(bytes: &[u8]) -> Vec<(String, String)> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut out = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let mut font = String::new();
        for op in &content.operations {
            match (op.operator.as_str(), op.operands.first()) {
                ("Tf", Some(Object::Name(name))) => font = String::from_utf8_lossy(name).into_owned(),
                ("Tj", Some(Object::String(bytes, _))) => {
                    out.push((String::from_utf8_lossy(bytes).into_owned(), font.clone()))
                }
                _ => {}
            }
        }
    }
    out
}

#[test]
fn test_inline_math_is_rendered_as_text() {
    let runs = tokenize(r"Energy $E = mc^2$ and $\frac{a+b}{c}$.");
    assert_eq!(
        runs,
        vec![
            StyledRun::Plain("Energy ".to_string()),
            StyledRun::Math("E = mc^2".to_string()),
            StyledRun::Plain(" and ".to_string()),
            StyledRun::Math("(a + b)/c".to_string()),
            StyledRun::Plain(".".to_string()),
        ]
    );
}

#[test]
fn test_math_inside_code_stays_literal() {
    let runs = tokenize(r"`let $x$ = 1` then $\alpha^2$");
    assert_eq!(runs[0], StyledRun::Code("let $x$ = 1".to_string()));
    assert_eq!(runs[2], StyledRun::Math(latex::render(r"\alpha^2")));
}

#[test]
fn test_math_in_list_items_and_headings() {
    let blocks = classify_document("# Sum $\\sum_{i=1}^{n} i$\n- root $\\sqrt{x}$\n");
    match &blocks[0] {
        ContentBlock::Heading { level, runs, .. } => {
            assert_eq!(*level, 1);
            assert!(runs.contains(&StyledRun::Math("sum_(i = 1)^n i".to_string())));
        }
        other => panic!("expected heading, got {:?}", other),
    }
    match &blocks[1] {
        ContentBlock::ListItem { runs, .. } => {
            assert!(runs.contains(&StyledRun::Math("sqrt(x)".to_string())));
        }
        other => panic!("expected list item, got {:?}", other),
    }
}

#[test]
fn test_math_reaches_the_pdf_in_oblique() {
    let (_, bytes) = render_pdf(
        &math_portfolio("Area: $\\frac{a+b}{c}$\n"),
        &LayoutStyle::default(),
    )
    .unwrap();
    let texts = texts_with_fonts(&bytes);
    let (_, font) = texts
        .iter()
        .find(|(text, _)| text == "(a + b)/c")
        .expect("rendered formula in PDF");
    assert_eq!(font, "F3");
}

#[test]
fn test_unsupported_math_falls_back_without_failing() {
    let (_, bytes) = render_pdf(
        &math_portfolio("Matrix $a & b$ and $\\beta_{ij}$\n"),
        &LayoutStyle::default(),
    )
    .unwrap();
    let texts: Vec<String> = texts_with_fonts(&bytes).into_iter().map(|(t, _)| t).collect();
    assert!(texts.iter().any(|t| t == "a & b"));
    let beta = latex::render(r"\beta_{ij}");
    assert!(texts.iter().any(|t| *t == beta));
}
