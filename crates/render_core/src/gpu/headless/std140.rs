//! Uniform block introspection for GLSL sources
//!
//! Finds `uniform Name { ... };` interface blocks and computes their std140 data
//! size. Supports scalar, vector and square matrix members and fixed-size arrays
//! of them, which covers the blocks this renderer declares.

/// One member of a uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMember {
    /// Member name
    pub name: String,
    /// Byte offset inside the block
    pub offset: usize,
    /// Size in bytes including array stride padding
    pub size: usize,
}

/// Layout of one uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockLayout {
    /// Block name as referenced by the API
    pub name: String,
    /// std140 data size in bytes
    pub size: usize,
    /// Members in declaration order
    pub members: Vec<BlockMember>,
}

/// (size, base alignment) of a non-array member type
fn type_layout(ty: &str) -> Option<(usize, usize)> {
    let layout = match ty {
        "float" | "int" | "uint" | "bool" => (4, 4),
        "vec2" | "ivec2" | "uvec2" | "bvec2" => (8, 8),
        "vec3" | "ivec3" | "uvec3" | "bvec3" => (12, 16),
        "vec4" | "ivec4" | "uvec4" | "bvec4" => (16, 16),
        // Matrices are arrays of column vectors with a 16 byte stride
        "mat2" => (32, 16),
        "mat3" => (48, 16),
        "mat4" => (64, 16),
        _ => return None,
    };
    Some(layout)
}

const QUALIFIERS: &[&str] = &["highp", "mediump", "lowp", "row_major", "column_major", "precise"];

fn round_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |end| &after[end + 2..]);
            out.push(' ');
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in source.chars() {
        if c.is_alphanumeric() || c == '_' || c == '#' {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse all uniform blocks declared in `source`
///
/// `Err` names the first member type that has no std140 layout here.
pub fn parse_uniform_blocks(source: &str) -> Result<Vec<UniformBlockLayout>, String> {
    let tokens = tokenize(&strip_comments(source));
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let is_block = tokens[i] == "uniform"
            && tokens.get(i + 2).is_some_and(|t| t == "{");
        if !is_block {
            i += 1;
            continue;
        }

        let name = tokens[i + 1].clone();
        let (block, next) = parse_block_body(&name, &tokens, i + 3)?;
        blocks.push(block);
        i = next;
    }

    Ok(blocks)
}

fn parse_block_body(name: &str, tokens: &[String], mut i: usize) -> Result<(UniformBlockLayout, usize), String> {
    let mut members = Vec::new();
    let mut offset = 0;

    while i < tokens.len() && tokens[i] != "}" {
        while tokens.get(i).is_some_and(|t| QUALIFIERS.contains(&t.as_str())) {
            i += 1;
        }
        let ty = tokens.get(i).ok_or("unterminated uniform block")?.as_str();
        let (size, alignment) = type_layout(ty)
            .ok_or_else(|| format!("unsupported member type '{ty}' in uniform block '{name}'"))?;
        i += 1;

        // One or more declarators: `a`, `b[4]`, separated by commas
        loop {
            let member = tokens.get(i).cloned().ok_or("unterminated uniform block")?;
            i += 1;

            let (member_size, member_alignment) = if tokens.get(i).is_some_and(|t| t == "[") {
                let count: usize = tokens
                    .get(i + 1)
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| format!("array '{member}' needs a constant size"))?;
                i += 3;
                let stride = round_up(size, 16);
                (stride * count, 16)
            } else {
                (size, alignment)
            };

            offset = round_up(offset, member_alignment);
            members.push(BlockMember { name: member, offset, size: member_size });
            offset += member_size;

            match tokens.get(i).map(String::as_str) {
                Some(",") => i += 1,
                Some(";") => {
                    i += 1;
                    break;
                }
                _ => return Err(format!("malformed declaration in uniform block '{name}'")),
            }
        }
    }

    if i >= tokens.len() {
        return Err(format!("unterminated uniform block '{name}'"));
    }

    let block = UniformBlockLayout {
        name: name.to_string(),
        size: round_up(offset, 16),
        members,
    };
    Ok((block, i + 1))
}
