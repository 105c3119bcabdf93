use super::element::ElementId;

/// 按身份（[`ElementId`]）区分元素的小集合，保留插入顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSet {
    elements: Vec<ElementId>,
}

impl ElementSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// 加入一个元素，已存在时返回 `false`。
    pub fn add(&mut self, element: ElementId) -> bool {
        if self.contains(element) {
            return false;
        }
        self.elements.push(element);
        true
    }

    /// 移除一个元素，不存在时返回 `false`。
    pub fn remove(&mut self, element: ElementId) -> bool {
        self.elements
            .iter()
            .position(|&e| e == element)
            .map(|index| self.elements.remove(index))
            .is_some()
    }

    #[must_use]
    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains(&element)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 按插入顺序复制出一份列表。
    #[must_use]
    pub fn to_vec(&self) -> Vec<ElementId> {
        self.elements.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().copied()
    }
}

impl FromIterator<ElementId> for ElementSet {
    fn from_iter<T: IntoIterator<Item = ElementId>>(iter: T) -> Self {
        let mut set = Self::new();
        for element in iter {
            set.add(element);
        }
        set
    }
}
