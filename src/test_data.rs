#[cfg(test)]
pub const POST_DATA: &str = r##"---
date: 2024-05-01
tags: rust,web
author: ines
category: tech
---

# Getting started

Intro paragraph with inline math $x^2$.

## Details

```rust
fn main() {
    println!("hi");
}
```

Closing words.
"##;
