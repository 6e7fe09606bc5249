//! Splits raw `<style>` text into rule fragments, one `selector { ... }` each.

/// Splits every block on `}` and closes each piece with a brace again.
///
/// Pieces that are only a closing brace after trimming (the tail after the last
/// rule) are dropped. A block without any `}` still yields one fragment, which
/// the rule parser will reject.
pub fn divide_fragments<S: AsRef<str>>(style_blocks: &[S]) -> Vec<String> {
    style_blocks
        .iter()
        .flat_map(|block| block.as_ref().split('}'))
        .map(|piece| format!("{}}}", piece).trim().to_string())
        .filter(|fragment| fragment != "}")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_fragment_per_rule() {
        let blocks = ["\n  a { color: red }\n  .x{margin:0}\n  p > b {padding:1px}\n"];
        let fragments = divide_fragments(&blocks);
        assert_eq!(
            fragments,
            vec!["a { color: red }", ".x{margin:0}", "p > b {padding:1px}"]
        );
        assert!(fragments.iter().all(|f| f.ends_with('}')));
    }

    #[test]
    fn keeps_block_order() {
        let blocks = vec!["a{color:red}".to_string(), "b{color:blue}".to_string()];
        assert_eq!(divide_fragments(&blocks), vec!["a{color:red}", "b{color:blue}"]);
    }

    #[test]
    fn block_without_closing_brace_still_yields_fragment() {
        assert_eq!(divide_fragments(&["a{color:red"]), vec!["a{color:red}"]);
    }

    #[test]
    fn empty_and_whitespace_blocks_yield_nothing() {
        assert!(divide_fragments(&["", "  \n "]).is_empty());
    }

    #[test]
    fn trailing_text_becomes_its_own_fragment() {
        assert_eq!(
            divide_fragments(&["a{color:red} junk"]),
            vec!["a{color:red}", "junk}"]
        );
    }
}
