use crate::command::command_model::FillCommand;
use crate::inject::injector::is_affirmative;
use crate::scan::locator::Locator;
use crate::scan::scan_model::FieldType;

/// Render a command set as a Playwright test that replays the fill.
///
/// Document commands have no native value and are left out.
pub fn generate_playwright_script(commands: &[FillCommand], url: &str) -> String {
    let mut code = String::new();
    code.push_str("import { test } from '@playwright/test';\n\n");
    code.push_str("test('autofill form', async ({ page }) => {\n");
    code.push_str(&format!("  await page.goto('{}');\n", js_escape(url)));

    for cmd in commands.iter().filter(|c| !c.is_document()) {
        let target = format!("page.locator('{}')", js_escape(&playwright_selector(&cmd.locator)));
        let line = match cmd.field_type {
            FieldType::Checkbox if is_affirmative(&cmd.value) => format!("await {}.check();", target),
            FieldType::Checkbox => format!("await {}.uncheck();", target),
            FieldType::Radio => format!("await {}.check();", target),
            FieldType::Select => format!("await {}.selectOption('{}');", target, js_escape(&cmd.value)),
            _ => format!("await {}.fill('{}');", target, js_escape(&cmd.value)),
        };
        code.push_str(&format!("  // {}\n  {}\n", cmd.field_key, line));
    }

    code.push_str("});\n");
    code
}

/// Playwright selector for a locator: `#id` when CSS-safe, else XPath.
pub fn playwright_selector(locator: &Locator) -> String {
    match locator {
        Locator::Id(id) if is_css_identifier(id) => format!("#{}", id),
        other => format!("xpath={}", other),
    }
}

fn is_css_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_that_are_not_css_safe_use_xpath() {
        assert_eq!(playwright_selector(&Locator::Id("email".into())), "#email");
        assert_eq!(
            playwright_selector(&Locator::Id("1st:name".into())),
            "xpath=//*[@id=\"1st:name\"]"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(js_escape("O'Brien"), "O\\'Brien");
    }
}
