#[macro_export]
macro_rules! ok_or_return {
    ($expr:expr) => {
        if let Ok(v) = $expr {
            v
        } else {
            return;
        }
    };
    ($expr:expr, $default: expr) => {
        if let Ok(v) = $expr {
            v
        } else {
            return $default;
        }
    }
}

#[macro_export]
macro_rules! some_or_return {
    ($expr:expr) => {
        if let Some(v) = $expr {
            v
        } else {
            return;
        }
    };
    ($expr:expr, $default: expr) => {
        if let Some(v) = $expr {
            v
        } else {
            return $default;
        }
    }
}

#[macro_export]
macro_rules! some_or_continue {
    ($expr:expr) => {
        if let Some(v) = $expr {
            v
        } else {
            continue;
        }
    };
}

/// Attaches children to a node, yielding `MeshResult<Element>`.
#[macro_export]
macro_rules! tree {
    ($node: expr, [ $($child: expr),* $(,)? ]) => {
        (|| -> $crate::error::MeshResult<$crate::element::Element> {
            let mut node = $node;
            $(node.add_child($child)?;)*
            Ok(node)
        })()
    };
}
