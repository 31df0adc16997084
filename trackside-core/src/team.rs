use core::ops::{Index, IndexMut};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    #[derivative(Default)]
    Us,
    Them,
}

impl TeamSide {
    pub fn other(self) -> Self {
        match self {
            Self::Us => Self::Them,
            Self::Them => Self::Us,
        }
    }
}

impl Display for TeamSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Us => write!(f, "Us"),
            Self::Them => write!(f, "Them"),
        }
    }
}

/// A pair of values, one per team side.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideBundle<T> {
    pub us: T,
    pub them: T,
}

impl<T> SideBundle<T> {
    pub fn iter(&self) -> impl Iterator<Item = (TeamSide, &T)> {
        self.into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TeamSide, &mut T)> {
        [(TeamSide::Us, &mut self.us), (TeamSide::Them, &mut self.them)].into_iter()
    }
}

impl<T: Eq> SideBundle<T> {
    pub fn are_not_equal(&self) -> bool {
        self.us != self.them
    }
}

impl<T> Index<TeamSide> for SideBundle<T> {
    type Output = T;

    fn index(&self, side: TeamSide) -> &Self::Output {
        match side {
            TeamSide::Us => &self.us,
            TeamSide::Them => &self.them,
        }
    }
}

impl<T> IndexMut<TeamSide> for SideBundle<T> {
    fn index_mut(&mut self, side: TeamSide) -> &mut Self::Output {
        match side {
            TeamSide::Us => &mut self.us,
            TeamSide::Them => &mut self.them,
        }
    }
}

impl<T: Display> Display for SideBundle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Us: {}, Them: {}", self.us, self.them)
    }
}

pub struct SideBundleIterator<'a, T> {
    bundle: &'a SideBundle<T>,
    index: usize,
}

impl<'a, T> Iterator for SideBundleIterator<'a, T> {
    type Item = (TeamSide, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.index {
            0 => (TeamSide::Us, &self.bundle.us),
            1 => (TeamSide::Them, &self.bundle.them),
            _ => return None,
        };

        self.index += 1;
        Some(value)
    }
}

impl<'a, T> IntoIterator for &'a SideBundle<T> {
    type Item = (TeamSide, &'a T);
    type IntoIter = SideBundleIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        SideBundleIterator {
            bundle: self,
            index: 0,
        }
    }
}

impl<T> IntoIterator for SideBundle<T> {
    type Item = (TeamSide, T);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        vec![(TeamSide::Us, self.us), (TeamSide::Them, self.them)].into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_other_side() {
        assert_eq!(TeamSide::Us.other(), TeamSide::Them);
        assert_eq!(TeamSide::Them.other(), TeamSide::Us);
    }

    #[test]
    fn test_bundle_index() {
        let mut bundle = SideBundle { us: 3u16, them: 7 };
        assert_eq!(bundle[TeamSide::Us], 3);
        assert_eq!(bundle[TeamSide::Them], 7);

        bundle[TeamSide::Them] += 1;
        assert_eq!(bundle[TeamSide::Them], 8);
    }

    #[test]
    fn test_bundle_iter() {
        let bundle = SideBundle { us: 1u8, them: 2 };
        let collected: Vec<_> = bundle.iter().collect();
        assert_eq!(
            collected,
            vec![(TeamSide::Us, &1), (TeamSide::Them, &2)]
        );
    }

    #[test]
    fn test_bundle_display() {
        let bundle = SideBundle { us: 4u16, them: 2 };
        assert_eq!(bundle.to_string(), "Us: 4, Them: 2");
    }
}
